//! Runtime configuration
//!
//! Built once at the CLI boundary (flags backed by environment variables)
//! and handed to each component by reference.

use directories::BaseDirs;
use std::path::PathBuf;

use crate::core::error::{FilecatError, Result};

/// Default number of concurrent readers
pub const DEFAULT_WORKERS: usize = 8;

/// Default per-file size ceiling in bytes (10 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default read chunk size in bytes (64 KB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Default number of attempts per file read
pub const DEFAULT_READ_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directories that browse and scan targets must stay under.
    /// Empty means the invoking user's home directory.
    pub allowed_roots: Vec<PathBuf>,

    pub workers: usize,

    pub max_file_size: u64,

    pub chunk_size: usize,

    pub read_attempts: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allowed_roots: Vec::new(),
            workers: DEFAULT_WORKERS,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            read_attempts: DEFAULT_READ_ATTEMPTS,
        }
    }
}

impl Config {
    /// Config restricted to the given roots, other settings at their defaults
    pub fn with_roots(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            allowed_roots: roots.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Reject out-of-range values
    pub fn validate(self) -> Result<Self> {
        if self.workers == 0 {
            return Err(FilecatError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(FilecatError::InvalidConfig(
                "max file size must be greater than 0".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(FilecatError::InvalidConfig(
                "chunk size must be greater than 0".to_string(),
            ));
        }
        if self.read_attempts == 0 {
            return Err(FilecatError::InvalidConfig(
                "read attempts must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    /// Allowed roots as configured, falling back to the home directory
    pub fn effective_roots(&self) -> Result<Vec<PathBuf>> {
        let roots: Vec<PathBuf> = self
            .allowed_roots
            .iter()
            .filter(|p| !p.as_os_str().is_empty())
            .cloned()
            .collect();
        if !roots.is_empty() {
            return Ok(roots);
        }

        BaseDirs::new()
            .map(|dirs| vec![dirs.home_dir().to_path_buf()])
            .ok_or_else(|| {
                FilecatError::InvalidConfig(
                    "no allowed roots configured and no home directory found".to_string(),
                )
            })
    }
}
