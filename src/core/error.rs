//! Error taxonomy for structural failures
//!
//! Per-file problems during a scan or a concatenation are absorbed into the
//! statistics; only the variants below abort an operation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilecatError {
    /// The canonical path lies outside every allowed root.
    #[error("Path is outside the allowed roots: {}", path.display())]
    PathDenied { path: PathBuf },

    #[error("Path is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Directory does not exist: {}", path.display())]
    RootNotFound { path: PathBuf },

    /// A selected path is not part of a fresh scan of the root.
    #[error("Selected file is not part of the scan: {path}")]
    UnknownSelection { path: String },

    #[error("Invalid selection document: {source}")]
    InvalidSelection {
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FilecatError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FilecatError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FilecatError>;
