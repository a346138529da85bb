//! Error type for the fallible edges of the crate
//!
//! Rendering itself never fails: missing or malformed survey data degrades to
//! placeholder content. Only reading files and serialising output can error.

use std::path::PathBuf;

/// Errors raised while loading inputs or writing outputs
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ReportError>;
