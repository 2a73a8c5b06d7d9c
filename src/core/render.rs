//! Renderer module
//!
//! Renders scan reports, browse listings and processing statistics to
//! jsonl, json or md.

use serde::Serialize;
use std::path::Path;

use crate::core::model::{
    BrowseResult, ExclusionReason, FileRecord, ProcessingStatistics, ScanReport, ScanStatistics,
};
use crate::core::util::format_size;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// One line of scan jsonl output
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ScanLine<'a> {
    File(&'a FileRecord),
    Stats {
        root: &'a Path,
        total_size: u64,
        #[serde(flatten)]
        stats: &'a ScanStatistics,
    },
}

pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.config.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|_| "{}".to_string())
    }

    /// Records first, then one stats object (jsonl) or a single object (json)
    pub fn render_scan(&self, report: &ScanReport) -> String {
        match self.config.format {
            OutputFormat::Jsonl => {
                let stats = ScanLine::Stats {
                    root: &report.root,
                    total_size: report.total_size(),
                    stats: &report.stats,
                };
                report
                    .records
                    .iter()
                    .map(ScanLine::File)
                    .chain(std::iter::once(stats))
                    .map(|line| self.to_json(&line))
                    .collect::<Vec<_>>()
                    .join(if self.config.pretty { "\n\n" } else { "\n" })
            }
            OutputFormat::Json => self.to_json(report),
            OutputFormat::Markdown => render_scan_markdown(report),
        }
    }

    pub fn render_browse(&self, result: &BrowseResult) -> String {
        match self.config.format {
            OutputFormat::Jsonl | OutputFormat::Json => self.to_json(result),
            OutputFormat::Markdown => render_browse_markdown(result),
        }
    }

    pub fn render_processing(&self, stats: &ProcessingStatistics) -> String {
        match self.config.format {
            OutputFormat::Jsonl | OutputFormat::Json => self.to_json(stats),
            OutputFormat::Markdown => render_processing_markdown(stats),
        }
    }
}

fn push_reasons<'a>(
    output: &mut String,
    reasons: impl Iterator<Item = (&'a ExclusionReason, &'a usize)>,
) {
    for (reason, count) in reasons {
        output.push_str(&format!("  - {}: {}\n", reason, count));
    }
}

fn push_errors(output: &mut String, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    output.push_str("\n## Errors\n\n");
    for error in errors {
        output.push_str(&format!("- {}\n", error));
    }
}

fn render_scan_markdown(report: &ScanReport) -> String {
    let mut output = format!("# Scan of `{}`\n\n", report.root.display());

    if !report.records.is_empty() {
        output.push_str("## Files\n\n");
        for record in &report.records {
            output.push_str(&format!(
                "- `{}` ({})\n",
                record.relative_path,
                format_size(record.size_bytes)
            ));
        }
        output.push('\n');
    }

    let stats = &report.stats;
    output.push_str("## Statistics\n\n");
    output.push_str(&format!("- Files seen: {}\n", stats.total_files_seen));
    output.push_str(&format!("- Included: {}\n", stats.files_included));
    output.push_str(&format!("- Skipped: {}\n", stats.files_skipped));
    push_reasons(&mut output, stats.per_reason_counts.iter());
    output.push_str(&format!("- Total size: {}\n", format_size(report.total_size())));
    push_errors(&mut output, &stats.errors);

    output
}

fn render_browse_markdown(result: &BrowseResult) -> String {
    let crumbs: Vec<&str> = result.breadcrumbs.iter().map(|c| c.name.as_str()).collect();
    let mut output = format!("# {}\n\n", crumbs.join(" / "));

    output.push_str(&format!("- Current: `{}`\n", result.current_path.display()));
    if let Some(parent) = &result.parent_path {
        output.push_str(&format!("- Parent: `{}`\n", parent.display()));
    }
    output.push('\n');

    if !result.directories.is_empty() {
        output.push_str("## Directories\n\n");
        for dir in &result.directories {
            output.push_str(&format!("- `{}`", dir.name));
            if dir.hidden {
                output.push_str(" (hidden)");
            }
            output.push('\n');
        }
    }

    output
}

fn render_processing_markdown(stats: &ProcessingStatistics) -> String {
    let mut output = String::from("## Processing Statistics\n\n");
    output.push_str(&format!("- Selected: {}\n", stats.selected_files));
    output.push_str(&format!("- Concatenated: {}\n", stats.concatenated_files));
    output.push_str(&format!("- Skipped: {}\n", stats.skipped_files));
    push_reasons(&mut output, stats.per_reason_counts.iter());
    output.push_str(&format!(
        "- Bytes processed: {}\n",
        format_size(stats.total_bytes_processed)
    ));
    output.push_str(&format!(
        "- Method: {} ({} workers)\n",
        stats.processing_method, stats.worker_count
    ));
    output.push_str(&format!(
        "- Tokens: {} (model: {})\n",
        stats.estimated_tokens, stats.token_model
    ));
    push_errors(&mut output, &stats.errors);
    output
}
