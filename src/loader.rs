//! Silver Parquet -> Postgres, replacing the sink table in one transaction.
//!
//! The whole artifact is read into memory, then inside a single transaction the
//! table is dropped, recreated from the Arrow schema, bulk-filled with
//! `COPY ... FROM STDIN (FORMAT csv)` and counted. Any error drops the
//! transaction, which rolls it back, so a half-written table is never visible.

use std::path::Path;

use arrow::datatypes::{DataType, Schema};
use arrow::record_batch::RecordBatch;
use postgres::{Client, NoTls, Transaction};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::io::parquet::read_parquet_batches;

/// Destination table in the warehouse.
pub const SINK_TABLE: &str = "stg_climate_daily";

/// Commands an operator runs to produce the loader's input.
pub const PRODUCER: &str = "climate-etl generate && climate-etl convert";

/// Map the staging schema's Arrow types to Postgres column types.
pub(crate) fn arrow_to_pg_type(dt: &DataType) -> &'static str {
    match dt {
        DataType::Float64 => "DOUBLE PRECISION",
        DataType::Timestamp(_, None) => "TIMESTAMP",
        _ => "TEXT",
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_list(schema: &Schema) -> String {
    schema
        .fields()
        .iter()
        .map(|f| quote_ident(f.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `DROP` + `CREATE` statements giving replace-table semantics.
pub(crate) fn replace_table_ddl(table: &str, schema: &Schema) -> String {
    let cols = schema
        .fields()
        .iter()
        .map(|f| {
            let null = if f.is_nullable() { "" } else { " NOT NULL" };
            format!("{} {}{null}", quote_ident(f.name()), arrow_to_pg_type(f.data_type()))
        })
        .collect::<Vec<_>>()
        .join(", ");
    let table = quote_ident(table);
    format!("DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({cols});")
}

fn copy_batches(
    tx: &mut Transaction<'_>,
    table: &str,
    schema: &Schema,
    batches: &[RecordBatch],
) -> Result<()> {
    let stmt = format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT csv)",
        quote_ident(table),
        column_list(schema)
    );
    let mut sink = tx.copy_in(stmt.as_str())?;
    {
        let mut csv = arrow::csv::WriterBuilder::new()
            .with_header(false)
            .build(&mut sink);
        for batch in batches {
            csv.write(batch)?;
        }
        csv.into_inner();
    }
    let copied = sink.finish()?;
    debug!(table, copied, "copy complete");
    Ok(())
}

/// The table must hold exactly the staged rows before the transaction commits.
pub(crate) fn check_row_count(table: &str, staged: usize, loaded: i64) -> Result<()> {
    if i64::try_from(staged).ok() == Some(loaded) {
        return Ok(());
    }
    Err(PipelineError::RowCountMismatch {
        table: table.to_string(),
        staged,
        loaded,
    })
}

/// Replace `table` with the contents of the Parquet file at `parquet_path`.
///
/// Returns the row count read back inside the same transaction.
///
/// # Errors
/// Codec, connection, and SQL failures, or [`PipelineError::RowCountMismatch`];
/// the transaction is rolled back on all of them.
pub fn load_parquet_to_table(parquet_path: &Path, database_url: &str, table: &str) -> Result<i64> {
    let (schema, batches) = read_parquet_batches(parquet_path)?;
    let staged_rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
    debug!(path = %parquet_path.display(), rows = staged_rows, "read silver parquet");

    let mut client = Client::connect(database_url, NoTls)?;
    let mut tx = client.transaction()?;
    tx.batch_execute(&replace_table_ddl(table, &schema))?;
    copy_batches(&mut tx, table, &schema, &batches)?;
    let count_sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let row_count: i64 = tx.query_one(count_sql.as_str(), &[])?.get(0);
    check_row_count(table, staged_rows, row_count)?;
    tx.commit()?;

    info!(table, rows = row_count, "replaced sink table");
    Ok(row_count)
}

/// Load the silver artifact at `parquet_path` into [`SINK_TABLE`].
///
/// # Errors
/// - [`PipelineError::MissingConfig`] if no connection string is configured
///   (checked first).
/// - [`PipelineError::MissingInput`] if the silver Parquet file is absent.
/// - Anything [`load_parquet_to_table`] returns.
pub fn load(config: &Config, parquet_path: &Path) -> Result<i64> {
    let database_url = config.require_database_url()?;
    if !parquet_path.exists() {
        return Err(PipelineError::MissingInput {
            artifact: "Silver Parquet",
            path: parquet_path.to_path_buf(),
            producer: PRODUCER,
        });
    }
    load_parquet_to_table(parquet_path, database_url, SINK_TABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parquet::staging_schema;

    #[test]
    fn ddl_follows_staging_schema() {
        let ddl = replace_table_ddl(SINK_TABLE, &staging_schema());
        assert!(ddl.starts_with("DROP TABLE IF EXISTS \"stg_climate_daily\";"));
        assert!(ddl.contains("\"date\" TIMESTAMP NOT NULL"));
        assert!(ddl.contains("\"lat\" DOUBLE PRECISION NOT NULL"));
        assert!(ddl.contains("\"location_id\" TEXT NOT NULL"));
    }

    #[test]
    fn staging_types_map_to_pg() {
        let types: Vec<_> = staging_schema()
            .fields()
            .iter()
            .map(|f| arrow_to_pg_type(f.data_type()))
            .collect();
        assert_eq!(
            types,
            [
                "TIMESTAMP",
                "TEXT",
                "TEXT",
                "DOUBLE PRECISION",
                "DOUBLE PRECISION",
                "DOUBLE PRECISION",
                "DOUBLE PRECISION",
                "TEXT"
            ]
        );
    }

    #[test]
    fn count_must_match_staged_rows() {
        assert!(check_row_count(SINK_TABLE, 20, 20).is_ok());
        let err = check_row_count(SINK_TABLE, 20, 19).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::RowCountMismatch { staged: 20, loaded: 19, .. }
        ));
        assert_eq!(
            err.to_string(),
            "stg_climate_daily holds 19 rows after load, expected 20 from staging"
        );
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(
            column_list(&staging_schema()),
            "\"date\", \"location_id\", \"location_name\", \"lat\", \"lon\", \
             \"t_mean_c\", \"precip_mm\", \"data_source\""
        );
    }

    #[test]
    fn missing_url_checked_before_input() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::new(tmp.path(), None);
        assert!(matches!(
            load(&cfg, &cfg.silver_parquet()),
            Err(PipelineError::MissingConfig { key: "DATABASE_URL" })
        ));
    }

    #[test]
    fn missing_silver_names_producers() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::new(tmp.path(), Some("postgres://localhost/none".into()));
        let err = load(&cfg, &cfg.silver_parquet()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { artifact: "Silver Parquet", .. }));
        assert!(err.to_string().contains("climate-etl convert"));
    }
}
