//! Error taxonomy for the pipeline stages and the orchestrator.

use std::path::PathBuf;

/// Errors produced by stage entry points and the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage's required input artifact is absent; `producer` is the command to run first.
    #[error("{artifact} not found at {}. Run: {producer}", path.display())]
    MissingInput {
        artifact: &'static str,
        path: PathBuf,
        producer: &'static str,
    },

    /// A required configuration value was not provided.
    #[error("{key} not set. Add it to your environment or .env file.")]
    MissingConfig { key: &'static str },

    /// A child step exited unsuccessfully. `code` is `None` when killed by a signal.
    #[error("Step failed: {step} (exit code {})", fmt_code(*code))]
    StepFailed { step: String, code: Option<i32> },

    /// A child step could not be launched at all.
    #[error("failed to launch step {step}: {source}")]
    Spawn {
        step: String,
        #[source]
        source: std::io::Error,
    },

    /// A generated day offset falls past the last representable calendar date.
    #[error("day offset {day} from {start} is outside the supported date range")]
    DateOutOfRange { start: chrono::NaiveDate, day: u32 },

    /// A landing value could not be cast to its staging type.
    #[error("cast error in row #{row}, column {column}: {value:?}")]
    Cast {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// The loaded table's row count disagrees with the staging artifact.
    #[error("{table} holds {loaded} rows after load, expected {staged} from staging")]
    RowCountMismatch {
        table: String,
        staged: usize,
        loaded: i64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error(transparent)]
    Postgres(#[from] postgres::Error),

    /// Failure inside a codec helper, already annotated with context.
    #[error(transparent)]
    Codec(#[from] anyhow::Error),
}

fn fmt_code(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
