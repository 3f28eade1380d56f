//! # climate-etl
//!
//! A small **bronze -> silver -> warehouse** pipeline for a daily climate sample.
//!
//! ## Stages
//!
//! 1. [`generator`] writes a deterministic multi-location time series as CSV
//!    (`<data-root>/bronze/sample_climate_daily.csv`).
//! 2. [`converter`] casts the CSV to typed columns and writes Parquet
//!    (`<data-root>/silver/climate_daily.parquet`).
//! 3. [`loader`] replaces the `stg_climate_daily` Postgres table with the
//!    Parquet contents inside one transaction and reports the row count.
//!
//! The [`orchestrator`] runs the stages in that order through a
//! [`runner::TaskRunner`]; the shipped [`runner::ProcessRunner`] launches each
//! stage as its own OS process and stops at the first non-zero exit.
//!
//! Stages share nothing but file paths. Configuration is resolved once into a
//! [`Config`] and handed to each entry point.
//!
//! ## Quick Start
//!
//! ```no_run
//! use climate_etl::{converter, generator, Config};
//! # fn main() -> climate_etl::Result<()> {
//! let cfg = Config::new("./data", None);
//! generator::generate_sample_csv(&cfg.bronze_csv(), generator::default_start(), 5)?;
//! converter::csv_to_parquet(&cfg.bronze_csv(), &cfg.silver_parquet())?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod converter;
pub mod error;
pub mod generator;
pub mod io;
pub mod loader;
pub mod logging;
pub mod orchestrator;
pub mod record;
pub mod runner;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use orchestrator::{default_steps, Orchestrator, PipelineState, RunReport, StepState};
pub use record::{Record, StagedRecord};
pub use runner::{ProcessRunner, Step, TaskOutput, TaskRunner};
