//! Selection of scanned records
//!
//! A selection is a set of relative paths. It is always resolved against a
//! fresh scan, so caller-supplied metadata (sizes, absolute paths, times) is
//! never trusted.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use tracing::debug;

use crate::core::error::{FilecatError, Result};
use crate::core::model::FileRecord;
use crate::core::paths::normalize_separators;

/// One entry of a selection document.
///
/// Mirrors the serialized [`FileRecord`] so that scan output can be edited
/// and fed back. Only `relative_path` and `selected` are used.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionEntry {
    pub relative_path: String,

    #[serde(default = "default_selected")]
    pub selected: bool,

    #[serde(default)]
    pub absolute_path: Option<PathBuf>,

    #[serde(default)]
    pub size_bytes: Option<u64>,

    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

fn default_selected() -> bool {
    true
}

impl SelectionEntry {
    fn carries_metadata(&self) -> bool {
        self.absolute_path.is_some() || self.size_bytes.is_some() || self.modified_at.is_some()
    }
}

/// Parse a JSON array of selection entries
pub fn parse_selection(text: &str) -> Result<Vec<SelectionEntry>> {
    serde_json::from_str(text).map_err(|source| FilecatError::InvalidSelection { source })
}

/// What the caller asked for
#[derive(Debug, Clone, Default)]
pub struct SelectionRequest {
    /// Entries from a selection document
    pub entries: Option<Vec<SelectionEntry>>,
    /// Paths to include; with no entries and no `only`, everything is included
    pub only: Vec<String>,
    /// Paths to drop (opt-out)
    pub exclude: Vec<String>,
}

fn normalize_request_path(path: &str) -> String {
    let path = normalize_separators(path);
    let mut trimmed = path.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.trim_start_matches('/').to_string()
}

/// Resolve the request against `records`.
///
/// Every named path must be part of the scan. The result is sorted by
/// relative path and free of duplicates.
pub fn select_records(records: &[FileRecord], request: &SelectionRequest) -> Result<Vec<FileRecord>> {
    let index: HashMap<&str, &FileRecord> = records
        .iter()
        .map(|r| (r.relative_path.as_str(), r))
        .collect();

    let known = |path: &str| -> Result<String> {
        let normalized = normalize_request_path(path);
        if index.contains_key(normalized.as_str()) {
            Ok(normalized)
        } else {
            Err(FilecatError::UnknownSelection {
                path: path.to_string(),
            })
        }
    };

    let mut wanted: BTreeSet<String> = BTreeSet::new();
    let mut restricted = false;

    if let Some(entries) = &request.entries {
        restricted = true;
        for entry in entries {
            let path = known(&entry.relative_path)?;
            if entry.carries_metadata() {
                debug!(path = %path, "Ignoring supplied metadata, using the fresh scan");
            }
            if entry.selected {
                wanted.insert(path);
            }
        }
    }

    if !request.only.is_empty() {
        restricted = true;
        for path in &request.only {
            wanted.insert(known(path)?);
        }
    }

    if !restricted {
        wanted.extend(records.iter().map(|r| r.relative_path.clone()));
    }

    for path in &request.exclude {
        wanted.remove(&known(path)?);
    }

    Ok(wanted
        .iter()
        .filter_map(|path| index.get(path.as_str()))
        .map(|record| (*record).clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(paths: &[&str]) -> Vec<FileRecord> {
        paths
            .iter()
            .map(|p| FileRecord::new(PathBuf::from("/root").join(p), *p, 1, Utc::now()))
            .collect()
    }

    fn selected(result: &[FileRecord]) -> Vec<&str> {
        result.iter().map(|r| r.relative_path.as_str()).collect()
    }

    #[test]
    fn test_empty_request_selects_everything_sorted() {
        let all = records(&["b.txt", "a.txt"]);
        let result = select_records(&all, &SelectionRequest::default()).unwrap();
        assert_eq!(selected(&result), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_only_and_exclude() {
        let all = records(&["a.txt", "b.txt", "src/c.rs"]);
        let request = SelectionRequest {
            only: vec!["./src/c.rs".to_string(), "a.txt".to_string(), "a.txt".to_string()],
            exclude: vec!["a.txt".to_string()],
            ..Default::default()
        };
        let result = select_records(&all, &request).unwrap();
        assert_eq!(selected(&result), vec!["src/c.rs"]);
    }

    #[test]
    fn test_exclude_only_is_opt_out() {
        let all = records(&["a.txt", "b.txt"]);
        let request = SelectionRequest {
            exclude: vec!["b.txt".to_string()],
            ..Default::default()
        };
        assert_eq!(selected(&select_records(&all, &request).unwrap()), vec!["a.txt"]);
    }

    #[test]
    fn test_unknown_path_is_rejected() {
        let all = records(&["a.txt"]);
        let request = SelectionRequest {
            only: vec!["../etc/passwd".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            select_records(&all, &request),
            Err(FilecatError::UnknownSelection { .. })
        ));
    }

    #[test]
    fn test_selection_document_uses_fresh_metadata() {
        let all = records(&["a.txt", "b.txt"]);
        let entries = parse_selection(
            r#"[
                {"relative_path": "a.txt", "size_bytes": 999999, "absolute_path": "/elsewhere/a.txt"},
                {"relative_path": "b.txt", "selected": false}
            ]"#,
        )
        .unwrap();
        let request = SelectionRequest {
            entries: Some(entries),
            ..Default::default()
        };

        let result = select_records(&all, &request).unwrap();
        assert_eq!(selected(&result), vec!["a.txt"]);
        assert_eq!(result[0].size_bytes, 1);
        assert_eq!(result[0].absolute_path, PathBuf::from("/root/a.txt"));
    }

    #[test]
    fn test_selection_document_rejects_unknown_fields() {
        let err = parse_selection(r#"[{"relative_path": "a.txt", "content": "x"}]"#).unwrap_err();
        assert!(matches!(err, FilecatError::InvalidSelection { .. }));
    }

    #[test]
    fn test_selection_document_requires_relative_path() {
        assert!(parse_selection(r#"[{"selected": true}]"#).is_err());
    }

    #[test]
    fn test_normalize_request_path() {
        assert_eq!(normalize_request_path("./a/b.txt"), "a/b.txt");
        assert_eq!(normalize_request_path("a\\b.txt"), "a/b.txt");
        assert_eq!(normalize_request_path("/a.txt"), "a.txt");
    }
}
