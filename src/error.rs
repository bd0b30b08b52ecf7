//! Fatal errors
//!
//! Only conditions that stop a run before any assessor starts live here.
//! Everything else is absorbed into the report as findings.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("Target path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Target path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type HealthResult<T> = Result<T, HealthError>;
