//! Artifact codecs: CSV for the landing layer, Parquet for the staging layer.

pub mod csv;
pub mod parquet;
