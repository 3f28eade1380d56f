//! Deterministic sample data for the bronze (landing) layer.

use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::io::csv::write_csv_table;
use crate::record::{round2, Record, COLUMNS, DATA_SOURCE, LOCATIONS};

/// Day count used when the caller does not supply one.
pub const DEFAULT_DAYS: u32 = 5;

/// First observation day used when the caller does not supply one.
#[must_use]
pub fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default()
}

/// Mean temperature for a (day offset, location index) pair.
#[must_use]
pub fn t_mean_c(day_offset: u32, location_index: usize) -> f64 {
    round2(2.0 + 0.6 * f64::from(day_offset) + 0.8 * location_index as f64)
}

/// Precipitation for a (day offset, location index) pair; never negative.
#[must_use]
pub fn precip_mm(day_offset: u32, location_index: usize) -> f64 {
    let raw = f64::from(day_offset % 5) * 1.2 - 0.3 * location_index as f64;
    round2(raw.max(0.0))
}

/// Build `days × LOCATIONS.len()` records, day-major, locations in fixed order.
///
/// Values depend only on the day offset and location index, so the same
/// arguments always yield the same table.
///
/// # Errors
/// [`PipelineError::DateOutOfRange`] if `start + day` overflows the calendar
/// for any day offset; no partial table is returned.
pub fn generate_records(start: NaiveDate, days: u32) -> Result<Vec<Record>> {
    let mut rows = Vec::with_capacity(days as usize * LOCATIONS.len());
    for day in 0..days {
        let date = start
            .checked_add_days(Days::new(u64::from(day)))
            .ok_or(PipelineError::DateOutOfRange { start, day })?;
        for (idx, loc) in LOCATIONS.iter().enumerate() {
            rows.push(Record {
                date,
                location_id: loc.id.to_string(),
                location_name: loc.name.to_string(),
                lat: loc.lat,
                lon: loc.lon,
                t_mean_c: t_mean_c(day, idx),
                precip_mm: precip_mm(day, idx),
                data_source: DATA_SOURCE.to_string(),
            });
        }
    }
    Ok(rows)
}

/// Generate the sample table and write it as CSV at `out_path`.
///
/// Missing parent directories are created. Returns the path written.
///
/// # Errors
/// [`PipelineError::DateOutOfRange`] before anything is written, otherwise
/// filesystem and CSV serialization failures.
pub fn generate_sample_csv(out_path: &Path, start: NaiveDate, days: u32) -> Result<PathBuf> {
    let rows = generate_records(start, days)?;
    debug!(rows = rows.len(), %start, days, "generated sample records");
    let n = write_csv_table(out_path, &COLUMNS, &rows)?;
    info!(path = %out_path.display(), rows = n, "wrote bronze csv");
    Ok(out_path.to_path_buf())
}
