//! Concatenation flow - Bundle selected files into one plain-text report
//!
//! Files are read by a bounded rayon pool and assembled in relative-path
//! order, so the report is identical for any worker count.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::backends::resolve::{ResolvedRoot, SecureResolver};
use crate::backends::scan::scan_files;
use crate::core::config::Config;
use crate::core::model::{ExclusionReason, FileRecord, ProcessingMethod, ProcessingStatistics};
use crate::core::paths::is_within;
use crate::core::render::{RenderConfig, Renderer};
use crate::core::stats::StatsAccumulator;
use crate::core::tokenizer::{count_tokens, TokenModel};
use crate::core::util::report_timestamp;
use crate::flows::select::{select_records, SelectionRequest};

pub const REPORT_TITLE: &str = "# File Concatenation for LLM Processing";

/// Last line of the report header
pub const REPORT_RULE: &str = "# ================================================";

/// Result of a bounded read
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Bytes(Vec<u8>),
    /// More than `limit` bytes were available
    TooLarge,
}

/// Where file contents come from
pub trait ContentSource: Send + Sync {
    /// Read at most `limit` bytes of `path` in `chunk_size` pieces
    fn read(&self, path: &Path, limit: u64, chunk_size: usize) -> io::Result<ReadOutcome>;
}

/// Reads from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl ContentSource for FsSource {
    fn read(&self, path: &Path, limit: u64, chunk_size: usize) -> io::Result<ReadOutcome> {
        let mut reader = File::open(path)?.take(limit.saturating_add(1));
        let mut content = Vec::new();
        let mut chunk = vec![0u8; chunk_size.max(1)];

        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            content.extend_from_slice(&chunk[..n]);
            if content.len() as u64 > limit {
                return Ok(ReadOutcome::TooLarge);
            }
        }

        Ok(ReadOutcome::Bytes(content))
    }
}

/// Concatenated report plus the statistics of producing it
#[derive(Debug)]
pub struct ConcatOutput {
    pub text: String,
    pub stats: ProcessingStatistics,
}

/// What happened to one selected file
enum FileOutcome {
    Content { text: String, bytes: u64, lossy: bool },
    Failed(String),
    Oversized,
}

pub struct Aggregator {
    max_file_size: u64,
    chunk_size: usize,
    read_attempts: usize,
    token_model: TokenModel,
    source: Box<dyn ContentSource>,
}

impl Aggregator {
    pub fn new(config: &Config) -> Self {
        Self {
            max_file_size: config.max_file_size,
            chunk_size: config.chunk_size,
            read_attempts: config.read_attempts.max(1),
            token_model: TokenModel::default(),
            source: Box::new(FsSource),
        }
    }

    pub fn with_token_model(mut self, token_model: TokenModel) -> Self {
        self.token_model = token_model;
        self
    }

    #[cfg(test)]
    pub fn with_source(mut self, source: impl ContentSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Concatenate `selected` files under `root`.
    ///
    /// Never fails: per-file problems become error blocks or skips in the
    /// statistics.
    pub fn concatenate(
        &self,
        root: &ResolvedRoot,
        selected: &[FileRecord],
        worker_count: usize,
    ) -> ConcatOutput {
        let mut ordered: Vec<&FileRecord> = selected.iter().collect();
        ordered.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        ordered.dedup_by(|a, b| a.relative_path == b.relative_path);

        let stats = StatsAccumulator::new();
        let mut method = ProcessingMethod::Sequential;
        let mut pool_size = 1;

        let outcomes: Vec<FileOutcome> = if worker_count > 1 && ordered.len() > 1 {
            let size = worker_count.min(ordered.len());
            match ThreadPoolBuilder::new()
                .num_threads(size)
                .thread_name(|i| format!("filecat-reader-{}", i))
                .build()
            {
                Ok(pool) => {
                    method = ProcessingMethod::Parallel;
                    pool_size = size;
                    pool.install(|| {
                        ordered
                            .par_iter()
                            .map(|record| self.process(root, record, &stats))
                            .collect()
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Cannot build reader pool, reading sequentially");
                    self.process_all(root, &ordered, &stats)
                }
            }
        } else {
            self.process_all(root, &ordered, &stats)
        };

        debug!(
            files = ordered.len(),
            method = %method,
            workers = pool_size,
            "Files read"
        );

        let mut text = report_header(root.as_path(), ordered.len());
        for (record, outcome) in ordered.iter().zip(&outcomes) {
            match outcome {
                FileOutcome::Content { text: content, .. } => {
                    text.push_str(&format!(
                        "\n### {} ###\n{}\n\n",
                        record.relative_path, content
                    ));
                }
                FileOutcome::Failed(message) => {
                    text.push_str(&format!(
                        "\n### ERROR: {} ###\nCould not read file: {}\n\n",
                        record.relative_path, message
                    ));
                    stats.record_error(format!(
                        "Error reading {}: {}",
                        record.relative_path, message
                    ));
                }
                FileOutcome::Oversized => {}
            }
        }

        let mut snapshot = stats.processing_snapshot(ordered.len(), method, pool_size);
        snapshot.output_bytes = text.len();
        snapshot.estimated_tokens = count_tokens(&text, self.token_model);
        snapshot.token_model = self.token_model.to_string();

        info!(
            concatenated = snapshot.concatenated_files,
            oversized = snapshot.reason_count(ExclusionReason::Oversized),
            errors = snapshot.errors.len(),
            tokens = snapshot.estimated_tokens,
            "Report assembled"
        );

        ConcatOutput {
            text,
            stats: snapshot,
        }
    }

    fn process_all(
        &self,
        root: &ResolvedRoot,
        ordered: &[&FileRecord],
        stats: &StatsAccumulator,
    ) -> Vec<FileOutcome> {
        ordered
            .iter()
            .map(|record| self.process(root, record, stats))
            .collect()
    }

    fn process(
        &self,
        root: &ResolvedRoot,
        record: &FileRecord,
        stats: &StatsAccumulator,
    ) -> FileOutcome {
        let outcome = self.read_record(root, record);
        match &outcome {
            FileOutcome::Content { bytes, lossy, .. } => {
                stats.record_included();
                stats.add_bytes(*bytes);
                if *lossy {
                    debug!(path = %record.relative_path, "Replaced undecodable bytes");
                    stats.record_lossy();
                }
            }
            FileOutcome::Failed(message) => {
                // The message is recorded during assembly, in path order
                warn!(path = %record.relative_path, error = %message, "Cannot read file");
                stats.record_skipped(ExclusionReason::Unreadable);
            }
            FileOutcome::Oversized => {
                debug!(
                    path = %record.relative_path,
                    limit = self.max_file_size,
                    "Skipping oversized file"
                );
                stats.record_skipped(ExclusionReason::Oversized);
            }
        }
        outcome
    }

    fn read_record(&self, root: &ResolvedRoot, record: &FileRecord) -> FileOutcome {
        let path = match revalidate(root, &record.relative_path) {
            Ok(path) => path,
            Err(message) => return FileOutcome::Failed(message),
        };

        let size = match fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(e) => return FileOutcome::Failed(e.to_string()),
        };
        if size > self.max_file_size {
            return FileOutcome::Oversized;
        }

        let mut attempt = 1;
        loop {
            match self.source.read(&path, self.max_file_size, self.chunk_size) {
                Ok(ReadOutcome::Bytes(bytes)) => {
                    let len = bytes.len() as u64;
                    let (text, lossy) = decode(bytes);
                    return FileOutcome::Content {
                        text,
                        bytes: len,
                        lossy,
                    };
                }
                Ok(ReadOutcome::TooLarge) => return FileOutcome::Oversized,
                Err(e) if is_final(&e) || attempt >= self.read_attempts => {
                    return FileOutcome::Failed(e.to_string());
                }
                Err(e) => {
                    debug!(path = %path.display(), attempt, error = %e, "Retrying read");
                    attempt += 1;
                }
            }
        }
    }
}

/// Re-resolve a scanned path: it must still be a regular file under `root`
fn revalidate(root: &ResolvedRoot, relative: &str) -> std::result::Result<PathBuf, String> {
    let canonical = root
        .as_path()
        .join(relative)
        .canonicalize()
        .map_err(|e| e.to_string())?;
    if !is_within(&canonical, root.as_path()) {
        return Err("path resolves outside the source directory".to_string());
    }
    if !canonical.is_file() {
        return Err("not a regular file".to_string());
    }
    Ok(canonical)
}

fn is_final(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    )
}

/// UTF-8 with replacement characters; the flag is set when any were needed
fn decode(bytes: Vec<u8>) -> (String, bool) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, false),
        Err(e) => (String::from_utf8_lossy(e.as_bytes()).into_owned(), true),
    }
}

fn report_header(root: &Path, count: usize) -> String {
    format!(
        "{}\n# Generated: {}\n# Source Directory: {}\n# Total Files Selected: {}\n{}\n\n",
        REPORT_TITLE,
        report_timestamp(Utc::now()),
        root.display(),
        count,
        REPORT_RULE
    )
}

/// Options for the concat command
#[derive(Debug, Clone, Default)]
pub struct ConcatOptions {
    pub request: SelectionRequest,
    /// Write the report here instead of stdout
    pub output: Option<PathBuf>,
    /// Print processing statistics to stderr
    pub show_stats: bool,
    pub token_model: TokenModel,
}

/// Run the concat command: fresh scan, selection, concatenation
pub fn run_concat(
    resolver: &SecureResolver,
    config: &Config,
    root: &Path,
    opts: ConcatOptions,
    render: RenderConfig,
) -> Result<()> {
    let root = resolver.resolve_root(root)?;
    let report = scan_files(&root);
    let selected = select_records(&report.records, &opts.request)?;
    if selected.is_empty() {
        bail!("No files selected for processing");
    }

    let aggregator = Aggregator::new(config).with_token_model(opts.token_model);
    let output = aggregator.concatenate(&root, &selected, config.workers);

    match &opts.output {
        Some(path) => {
            fs::write(path, &output.text)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), bytes = output.text.len(), "Report written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(output.text.as_bytes())
                .and_then(|_| stdout.flush())
                .context("Failed to write report to stdout")?;
        }
    }

    if opts.show_stats {
        let renderer = Renderer::with_config(render);
        eprintln!("{}", renderer.render_processing(&output.stats));
    }

    Ok(())
}
