//! File discovery backend
//!
//! Walks a resolved root with walkdir, prunes noise directories, classifies
//! every file and returns the included records sorted by relative path.

use anyhow::Result;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::backends::resolve::{ResolvedRoot, SecureResolver};
use crate::core::classify::{is_excluded_directory, is_hidden, is_probably_binary};
use crate::core::model::{ExclusionReason, FileRecord, ScanReport};
use crate::core::paths::make_relative;
use crate::core::render::{RenderConfig, Renderer};
use crate::core::stats::StatsAccumulator;
use crate::core::util::modified_at;

/// Scan files under an already resolved root.
///
/// Listing errors are recorded and the affected subtree is skipped; the scan
/// itself never fails. Symlinks are not followed.
pub fn scan_files(root: &ResolvedRoot) -> ScanReport {
    let root_path = root.as_path();
    let stats = StatsAccumulator::new();
    let mut records = Vec::new();

    info!(root = %root_path.display(), "Scanning");

    let walker = WalkDir::new(root_path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if is_excluded_directory(&name) {
                debug!(path = %entry.path().display(), "Pruning directory");
                stats.record_pruned_directory();
                return false;
            }
            true
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let location = e.path().unwrap_or(root_path).display().to_string();
                warn!(path = %location, error = %e, "Cannot list directory");
                stats.record_error(format!("Error listing {}: {}", location, e));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        stats.record_seen();
        let path = entry.path();

        if is_hidden(&entry.file_name().to_string_lossy()) {
            debug!(path = %path.display(), "Skipping hidden file");
            stats.record_skipped(ExclusionReason::Hidden);
            continue;
        }

        if is_probably_binary(path) {
            debug!(path = %path.display(), "Skipping binary file");
            stats.record_skipped(ExclusionReason::Binary);
            continue;
        }

        match record_for(path, root_path) {
            Ok(record) => {
                records.push(record);
                stats.record_included();
            }
            Err(message) => {
                warn!(path = %path.display(), error = %message, "Cannot access file");
                stats.record_failure(ExclusionReason::Unreadable, message);
            }
        }
    }

    records.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    let stats = stats.scan_snapshot();
    info!(
        included = stats.files_included,
        skipped = stats.files_skipped,
        pruned = stats.reason_count(ExclusionReason::ExcludedDirectory),
        errors = stats.errors.len(),
        "Scan finished"
    );

    ScanReport {
        root: root_path.to_path_buf(),
        records,
        stats,
    }
}

fn record_for(path: &Path, root: &Path) -> std::result::Result<FileRecord, String> {
    let metadata = path
        .metadata()
        .map_err(|e| format!("Error accessing {}: {}", path.display(), e))?;
    let relative = make_relative(path, root)
        .ok_or_else(|| format!("Error accessing {}: path is not valid UTF-8", path.display()))?;

    Ok(FileRecord::new(
        path.to_path_buf(),
        relative,
        metadata.len(),
        modified_at(&metadata),
    ))
}

/// Run the scan command
pub fn run_scan(resolver: &SecureResolver, root: &Path, config: RenderConfig) -> Result<()> {
    let root = resolver.resolve_root(root)?;
    let report = scan_files(&root);

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render_scan(&report));

    Ok(())
}
