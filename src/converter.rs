//! Bronze CSV -> silver Parquet with fixed-column type enforcement.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::io::csv::read_csv_vec;
use crate::io::parquet::write_parquet_vec;
use crate::record::{RawRecord, StagedRecord};

/// Command an operator runs to produce the converter's input.
pub const PRODUCER: &str = "climate-etl generate";

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn parse_float(row: usize, column: &'static str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|_| PipelineError::Cast {
        row,
        column,
        value: raw.to_string(),
    })
}

/// Cast one raw landing row; `row` is 1-based for diagnostics.
///
/// # Errors
/// Returns [`PipelineError::Cast`] naming the first column that fails to parse.
pub fn cast_record(row: usize, raw: RawRecord) -> Result<StagedRecord> {
    let date = parse_date(&raw.date).ok_or_else(|| PipelineError::Cast {
        row,
        column: "date",
        value: raw.date.clone(),
    })?;
    Ok(StagedRecord {
        date,
        lat: parse_float(row, "lat", &raw.lat)?,
        lon: parse_float(row, "lon", &raw.lon)?,
        t_mean_c: parse_float(row, "t_mean_c", &raw.t_mean_c)?,
        precip_mm: parse_float(row, "precip_mm", &raw.precip_mm)?,
        location_id: raw.location_id,
        location_name: raw.location_name,
        data_source: raw.data_source,
    })
}

/// Read the bronze CSV at `in_csv`, cast it, and write Parquet at `out_parquet`.
///
/// Any row that fails to cast aborts the whole conversion; nothing is skipped.
///
/// # Errors
/// - [`PipelineError::MissingInput`] if `in_csv` does not exist.
/// - [`PipelineError::Cast`] for the first malformed value.
/// - Codec and filesystem failures otherwise.
pub fn csv_to_parquet(in_csv: &Path, out_parquet: &Path) -> Result<PathBuf> {
    if !in_csv.exists() {
        return Err(PipelineError::MissingInput {
            artifact: "Bronze CSV",
            path: in_csv.to_path_buf(),
            producer: PRODUCER,
        });
    }

    let raw: Vec<RawRecord> = read_csv_vec(in_csv, true)?;
    debug!(path = %in_csv.display(), rows = raw.len(), "read bronze csv");

    let staged = raw
        .into_iter()
        .enumerate()
        .map(|(i, r)| cast_record(i + 1, r))
        .collect::<Result<Vec<_>>>()?;

    let n = write_parquet_vec(out_parquet, &staged)?;
    info!(path = %out_parquet.display(), rows = n, "wrote silver parquet");
    Ok(out_parquet.to_path_buf())
}
