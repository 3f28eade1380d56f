//! Runtime configuration, resolved once at startup and passed into each stage.

use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Environment key for the data root directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
/// Environment key for the warehouse connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Data root used when nothing else is configured.
pub const DEFAULT_DATA_DIR: &str = "./data";

const BRONZE_FILE: &str = "sample_climate_daily.csv";
const SILVER_FILE: &str = "climate_daily.parquet";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Root under which `bronze/` and `silver/` live.
    pub data_dir: PathBuf,
    /// Connection string for the warehouse; only the load stage needs it.
    pub database_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            database_url: None,
        }
    }
}

impl Config {
    /// Build a config, treating an empty connection string as absent.
    pub fn new(data_dir: impl Into<PathBuf>, database_url: Option<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            database_url: database_url.filter(|u| !u.trim().is_empty()),
        }
    }

    pub fn bronze_dir(&self) -> PathBuf {
        self.data_dir.join("bronze")
    }

    pub fn silver_dir(&self) -> PathBuf {
        self.data_dir.join("silver")
    }

    /// Default landing artifact path.
    pub fn bronze_csv(&self) -> PathBuf {
        self.bronze_dir().join(BRONZE_FILE)
    }

    /// Default staging artifact path.
    pub fn silver_parquet(&self) -> PathBuf {
        self.silver_dir().join(SILVER_FILE)
    }

    /// The connection string, or a missing-configuration error.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .ok_or(PipelineError::MissingConfig { key: DATABASE_URL_ENV })
    }

    /// Environment entries that reproduce this config in a child process.
    pub fn child_env(&self) -> Vec<(&'static str, String)> {
        let mut env = vec![(DATA_DIR_ENV, path_str(&self.data_dir))];
        if let Some(url) = &self.database_url {
            env.push((DATABASE_URL_ENV, url.clone()));
        }
        env
    }
}

fn path_str(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}
