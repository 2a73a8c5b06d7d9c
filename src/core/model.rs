//! Data model shared by scanning, browsing and concatenation
//!
//! Records are created by a scan, never mutated afterwards, and discarded
//! once the command finishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One discovered file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Fully resolved location on disk
    pub absolute_path: PathBuf,

    /// Path relative to the scanned root, using '/' as separator
    pub relative_path: String,

    /// Size at discovery time
    pub size_bytes: u64,

    /// Last modification at discovery time
    pub modified_at: DateTime<Utc>,

    /// Opt-out selection flag
    pub selected: bool,
}

impl FileRecord {
    pub fn new(
        absolute_path: PathBuf,
        relative_path: impl Into<String>,
        size_bytes: u64,
        modified_at: DateTime<Utc>,
    ) -> Self {
        Self {
            absolute_path,
            relative_path: relative_path.into(),
            size_bytes,
            modified_at,
            selected: true,
        }
    }
}

/// Why a file or directory was left out
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    Hidden,
    ExcludedDirectory,
    Binary,
    Oversized,
    Unreadable,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::Hidden => "hidden",
            ExclusionReason::ExcludedDirectory => "excluded_directory",
            ExclusionReason::Binary => "binary",
            ExclusionReason::Oversized => "oversized",
            ExclusionReason::Unreadable => "unreadable",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters produced by one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStatistics {
    pub total_files_seen: usize,
    pub files_included: usize,
    pub files_skipped: usize,

    /// Skip breakdown. `excluded_directory` counts pruned directories,
    /// not the files beneath them.
    pub per_reason_counts: BTreeMap<ExclusionReason, usize>,

    pub errors: Vec<String>,
}

impl ScanStatistics {
    pub fn reason_count(&self, reason: ExclusionReason) -> usize {
        self.per_reason_counts.get(&reason).copied().unwrap_or(0)
    }
}

/// How file contents were read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMethod {
    #[default]
    Sequential,
    Parallel,
}

impl fmt::Display for ProcessingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingMethod::Sequential => f.write_str("sequential"),
            ProcessingMethod::Parallel => f.write_str("parallel"),
        }
    }
}

/// Counters produced by one concatenation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStatistics {
    pub selected_files: usize,
    pub concatenated_files: usize,
    pub skipped_files: usize,
    pub per_reason_counts: BTreeMap<ExclusionReason, usize>,
    pub total_bytes_processed: u64,

    /// Files that needed replacement characters while decoding
    pub lossy_files: usize,

    pub processing_method: ProcessingMethod,
    pub worker_count: usize,
    pub output_bytes: usize,
    pub estimated_tokens: usize,
    pub token_model: String,
    pub errors: Vec<String>,
}

impl ProcessingStatistics {
    pub fn reason_count(&self, reason: ExclusionReason) -> usize {
        self.per_reason_counts.get(&reason).copied().unwrap_or(0)
    }
}

/// A child directory shown while browsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseEntry {
    pub name: String,
    pub path: PathBuf,
    pub hidden: bool,
}

/// One step of the breadcrumb chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub name: String,
    pub path: PathBuf,
}

/// Listing returned by a browse call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseResult {
    pub current_path: PathBuf,

    /// None when `current_path` is itself an allowed root
    pub parent_path: Option<PathBuf>,

    pub breadcrumbs: Vec<Breadcrumb>,
    pub directories: Vec<BrowseEntry>,
}

/// Records and counters of a finished scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub records: Vec<FileRecord>,
    pub stats: ScanStatistics,
}

impl ScanReport {
    pub fn total_size(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }
}
