//! Parquet I/O for the staging layer.
//!
//! This module provides:
//! - the fixed staging schema: [`staging_schema`]
//! - row <-> Arrow conversion: [`to_record_batch`] / [`from_record_batch`]
//! - file I/O: [`write_parquet_vec`], [`read_parquet_vec`], [`read_parquet_batches`]
//! - metadata-only row counting: [`parquet_row_count`]
//!
//! The schema is declared explicitly rather than inferred so that every column
//! carries its enforced type even for a zero-row file.

use crate::record::{StagedRecord, COLUMNS};
use anyhow::{anyhow, Context, Result};
use arrow::array::{Array, ArrayRef, Float64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::{create_dir_all, File};
use std::path::Path;
use std::sync::Arc;

/// Arrow schema of the staging artifact, in [`COLUMNS`] order.
#[must_use]
pub fn staging_schema() -> SchemaRef {
    let ts = DataType::Timestamp(TimeUnit::Microsecond, None);
    let types = [
        ts,
        DataType::Utf8,
        DataType::Utf8,
        DataType::Float64,
        DataType::Float64,
        DataType::Float64,
        DataType::Float64,
        DataType::Utf8,
    ];
    let fields: Vec<Field> = COLUMNS
        .iter()
        .zip(types)
        .map(|(name, dt)| Field::new(*name, dt, false))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Build one `RecordBatch` holding every row.
///
/// # Errors
/// Returns an error if Arrow rejects the column set (should not happen for a
/// well-formed schema).
pub fn to_record_batch(rows: &[StagedRecord]) -> Result<RecordBatch> {
    let floats = |f: fn(&StagedRecord) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(rows.iter().map(f)))
    };
    let strings = |f: fn(&StagedRecord) -> &str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(rows.iter().map(f)))
    };
    let dates = TimestampMicrosecondArray::from_iter_values(
        rows.iter().map(|r| r.date.and_utc().timestamp_micros()),
    );

    let columns: Vec<ArrayRef> = vec![
        Arc::new(dates),
        strings(|r| r.location_id.as_str()),
        strings(|r| r.location_name.as_str()),
        floats(|r| r.lat),
        floats(|r| r.lon),
        floats(|r| r.t_mean_c),
        floats(|r| r.precip_mm),
        strings(|r| r.data_source.as_str()),
    ];
    RecordBatch::try_new(staging_schema(), columns).context("assemble staging RecordBatch")
}

fn column<'a, A: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a A> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("missing column {name}"))?
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| anyhow!("column {name} has unexpected type"))
}

/// Convert a staging `RecordBatch` back into typed rows.
///
/// # Errors
/// Returns an error if a column is missing, has the wrong Arrow type, or
/// holds a timestamp outside chrono's range.
pub fn from_record_batch(batch: &RecordBatch) -> Result<Vec<StagedRecord>> {
    let date = column::<TimestampMicrosecondArray>(batch, "date")?;
    let location_id = column::<StringArray>(batch, "location_id")?;
    let location_name = column::<StringArray>(batch, "location_name")?;
    let lat = column::<Float64Array>(batch, "lat")?;
    let lon = column::<Float64Array>(batch, "lon")?;
    let t_mean_c = column::<Float64Array>(batch, "t_mean_c")?;
    let precip_mm = column::<Float64Array>(batch, "precip_mm")?;
    let data_source = column::<StringArray>(batch, "data_source")?;

    (0..batch.num_rows())
        .map(|i| {
            let micros = date.value(i);
            let date = DateTime::from_timestamp_micros(micros)
                .ok_or_else(|| anyhow!("timestamp {micros} out of range in row #{}", i + 1))?
                .naive_utc();
            Ok(StagedRecord {
                date,
                location_id: location_id.value(i).to_string(),
                location_name: location_name.value(i).to_string(),
                lat: lat.value(i),
                lon: lon.value(i),
                t_mean_c: t_mean_c.value(i),
                precip_mm: precip_mm.value(i),
                data_source: data_source.value(i).to_string(),
            })
        })
        .collect()
}

/// Write typed rows to a Parquet file, creating parent directories.
///
/// This works even when `data` is empty (a zero-row batch is written).
///
/// # Returns
/// Number of rows written (`data.len()`).
///
/// # Errors
/// An error is returned if the conversion, file creation, or writing fails.
pub fn write_parquet_vec(path: impl AsRef<Path>, data: &[StagedRecord]) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }

    let batch = to_record_batch(data)?;

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let props = WriterProperties::builder().build();
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), Some(props)).context("create ArrowWriter")?;
    writer.write(&batch).context("write batch to parquet")?;
    writer.close().context("close ArrowWriter")?;

    Ok(data.len())
}

/// Read every batch of a Parquet file along with its Arrow schema.
///
/// # Errors
/// Returns an error if the file cannot be opened, the reader cannot be built,
/// or batch iteration fails.
pub fn read_parquet_batches(path: impl AsRef<Path>) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;

    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("open ParquetRecordBatchReader")?;
    let schema = Arc::clone(builder.schema());
    let reader = builder
        .with_batch_size(64 * 1024)
        .build()
        .context("build ParquetRecordBatchReader")?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("read next batch")?;
    Ok((schema, batches))
}

/// Read a staging Parquet file into typed rows.
///
/// # Errors
/// See [`read_parquet_batches`] and [`from_record_batch`].
pub fn read_parquet_vec(path: impl AsRef<Path>) -> Result<Vec<StagedRecord>> {
    let (_, batches) = read_parquet_batches(path)?;
    let mut out = Vec::new();
    for batch in &batches {
        out.append(&mut from_record_batch(batch)?);
    }
    Ok(out)
}

/// Total row count from file metadata, without decoding any pages.
///
/// # Errors
/// Returns an error if the file cannot be opened or metadata cannot be read.
pub fn parquet_row_count(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(f).context("open SerializedFileReader")?;
    let meta = reader.metadata();
    Ok((0..meta.num_row_groups())
        .map(|i| meta.row_group(i).num_rows().cast_unsigned())
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(day: u32, id: &str) -> StagedRecord {
        StagedRecord {
            date: NaiveDate::from_ymd_opt(2010, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            location_id: id.into(),
            location_name: "Somewhere".into(),
            lat: 45.5,
            lon: -73.25,
            t_mean_c: 2.6,
            precip_mm: 0.9,
            data_source: "test".into(),
        }
    }

    #[test]
    fn schema_enforces_types() {
        let schema = staging_schema();
        assert_eq!(
            schema.field(0).data_type(),
            &DataType::Timestamp(TimeUnit::Microsecond, None)
        );
        let names: Vec<_> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, COLUMNS);
        assert_eq!(schema.field(6).data_type(), &DataType::Float64);
        assert_eq!(schema.field(7).data_type(), &DataType::Utf8);
    }

    #[test]
    fn file_roundtrip_and_metadata_count() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("silver/rows.parquet");
        let data = vec![row(1, "A"), row(2, "B"), row(3, "C")];

        assert_eq!(write_parquet_vec(&path, &data)?, 3);
        assert_eq!(parquet_row_count(&path)?, 3);
        assert_eq!(read_parquet_vec(&path)?, data);
        Ok(())
    }

    #[test]
    fn zero_rows_keep_schema() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("empty.parquet");
        write_parquet_vec(&path, &[])?;
        let (schema, batches) = read_parquet_batches(&path)?;
        assert_eq!(schema.fields().len(), COLUMNS.len());
        assert_eq!(batches.iter().map(RecordBatch::num_rows).sum::<usize>(), 0);
        assert_eq!(parquet_row_count(&path)?, 0);
        Ok(())
    }
}
