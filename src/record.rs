//! Row types shared by every stage.
//!
//! A [`Record`] is what the generator produces and what the landing CSV holds.
//! A [`StagedRecord`] is the typed form after the converter's cast: the date
//! becomes a timestamp and the numeric columns are guaranteed `f64`.
//!
//! Both types serialize in the same column order, listed in [`COLUMNS`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Column names in on-disk order for both the landing and staging artifacts.
pub const COLUMNS: [&str; 8] = [
    "date",
    "location_id",
    "location_name",
    "lat",
    "lon",
    "t_mean_c",
    "precip_mm",
    "data_source",
];

/// Provenance tag written into every generated row.
pub const DATA_SOURCE: &str = "sample_generator";

/// A fixed physical location in the closed location dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub id: &'static str,
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

/// The closed location dimension, in stable generation order.
pub const LOCATIONS: [Location; 4] = [
    Location { id: "LOC001", name: "Toronto", lat: 43.6532, lon: -79.3832 },
    Location { id: "LOC002", name: "Ottawa", lat: 45.4215, lon: -75.6972 },
    Location { id: "LOC003", name: "Montreal", lat: 45.5019, lon: -73.5674 },
    Location { id: "LOC004", name: "Vancouver", lat: 49.2827, lon: -123.1207 },
];

/// One daily observation for one location (landing layer).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    pub location_id: String,
    pub location_name: String,
    pub lat: f64,
    pub lon: f64,
    pub t_mean_c: f64,
    pub precip_mm: f64,
    pub data_source: String,
}

/// A landing row before casting: every value is the raw string from disk.
#[derive(Clone, Debug, Deserialize)]
pub struct RawRecord {
    pub date: String,
    pub location_id: String,
    pub location_name: String,
    pub lat: String,
    pub lon: String,
    pub t_mean_c: String,
    pub precip_mm: String,
    pub data_source: String,
}

/// A typed staging row; `date` is midnight of the observation day.
#[derive(Clone, Debug, PartialEq)]
pub struct StagedRecord {
    pub date: NaiveDateTime,
    pub location_id: String,
    pub location_name: String,
    pub lat: f64,
    pub lon: f64,
    pub t_mean_c: f64,
    pub precip_mm: f64,
    pub data_source: String,
}

impl From<&Record> for StagedRecord {
    fn from(r: &Record) -> Self {
        Self {
            date: r.date.and_hms_opt(0, 0, 0).unwrap_or_default(),
            location_id: r.location_id.clone(),
            location_name: r.location_name.clone(),
            lat: r.lat,
            lon: r.lon,
            t_mean_c: r.t_mean_c,
            precip_mm: r.precip_mm,
            data_source: r.data_source.clone(),
        }
    }
}

/// Round to two decimal places, half away from zero.
#[must_use]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
