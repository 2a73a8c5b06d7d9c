//! CLI module - Command-line interface definitions and handlers

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use crate::backends::resolve::SecureResolver;
use crate::core::config::{
    Config, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FILE_SIZE, DEFAULT_READ_ATTEMPTS, DEFAULT_WORKERS,
};
use crate::core::render::{OutputFormat, RenderConfig, Renderer};
use crate::core::tokenizer::TokenModel;
use crate::flows::concat::{run_concat, ConcatOptions};
use crate::flows::select::{parse_selection, SelectionRequest};

/// filecat - discover, classify and concatenate project files for LLM prompts.
#[derive(Parser, Debug)]
#[command(name = "filecat")]
#[command(
    author,
    version,
    about,
    long_about = r#"filecat browses directories inside a set of allowed roots, scans a root for
text files (skipping hidden entries, dependency/VCS directories and binaries),
and concatenates a selection of those files into a single plain-text report.

Output formats for browse/scan results and concat statistics:
- jsonl: one JSON object per line (default)
- json: a single JSON object
- md: human-friendly Markdown

Examples:
    filecat browse ~/projects
    filecat scan ~/projects/app
    filecat concat ~/projects/app --exclude Cargo.lock --output app.txt --stats
"#
)]
pub struct Cli {
    /// Output format (jsonl/json/md).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        long_help = "Select the output format for browse and scan results and for\n\
concat statistics.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- md (markdown)"
    )]
    pub format: String,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Quiet mode (errors only on stderr).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug diagnostics on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directories that browse and scan targets must stay under.
    #[arg(
        long,
        global = true,
        env = "FILECAT_ALLOWED_ROOTS",
        value_name = "DIRS",
        value_delimiter = ',',
        long_help = "Comma-separated list of allowed root directories.\n\n\
Every browse, scan and concat target is canonicalized and must lie inside one\n\
of them. Defaults to your home directory."
    )]
    pub allowed_roots: Vec<PathBuf>,

    /// Number of concurrent file readers for concat.
    #[arg(long, global = true, env = "FILECAT_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Files larger than this many bytes are skipped by concat.
    #[arg(
        long,
        global = true,
        env = "FILECAT_MAX_FILE_SIZE",
        value_name = "BYTES",
        default_value_t = DEFAULT_MAX_FILE_SIZE
    )]
    pub max_file_size: u64,

    /// Read chunk size in bytes.
    #[arg(
        long,
        global = true,
        env = "FILECAT_CHUNK_SIZE",
        value_name = "BYTES",
        default_value_t = DEFAULT_CHUNK_SIZE
    )]
    pub chunk_size: usize,

    /// Attempts per file read before giving up.
    #[arg(
        long,
        global = true,
        env = "FILECAT_READ_ATTEMPTS",
        value_name = "N",
        default_value_t = DEFAULT_READ_ATTEMPTS
    )]
    pub read_attempts: usize,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter level for the chosen verbosity
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }

    fn config(&self) -> Result<Config> {
        let config = Config {
            workers: self.workers,
            max_file_size: self.max_file_size,
            chunk_size: self.chunk_size,
            read_attempts: self.read_attempts,
            ..Config::with_roots(self.allowed_roots.iter().cloned())
        };
        Ok(config.validate()?)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the subdirectories of a directory inside the allowed roots.
    #[command(
        long_about = "List the child directories of PATH (or of the first allowed root),\n\
with the parent directory and a breadcrumb trail that never leave the allowed roots.\n\n\
Examples:\n\
  filecat browse\n\
  filecat browse ~/projects --format md\n"
    )]
    Browse {
        /// Directory to list.
        path: Option<PathBuf>,
    },

    /// Scan a root and list the text files a concat would consider.
    #[command(
        long_about = "Walk ROOT and emit one record per included file, sorted by relative\n\
path, followed by scan statistics.\n\n\
Hidden files, binary files and the contents of dependency, cache and VCS\n\
directories (node_modules, __pycache__, .git, .venv, ...) are skipped and counted."
    )]
    Scan {
        /// Directory to scan.
        root: PathBuf,
    },

    /// Concatenate files under a root into one plain-text report.
    #[command(
        long_about = "Scan ROOT, select files and write their contents, in relative-path\n\
order, into a single report with a header per file.\n\n\
Without --only or --selection every scanned file is selected; --exclude removes\n\
files from the selection. Selected paths must be part of the scan.\n\n\
Examples:\n\
  filecat concat . --output context.txt\n\
  filecat concat . --only src/main.rs,README.md --stats\n\
  filecat scan . --format json > files.json  # edit, then:\n\
  filecat concat . --selection selection.json\n"
    )]
    Concat {
        /// Directory to concatenate.
        root: PathBuf,

        /// Relative paths to include (comma-separated or repeated).
        #[arg(long, value_name = "PATHS", value_delimiter = ',')]
        only: Vec<String>,

        /// Relative paths to leave out (comma-separated or repeated).
        #[arg(long, value_name = "PATHS", value_delimiter = ',')]
        exclude: Vec<String>,

        /// JSON array of selection entries.
        #[arg(
            long,
            value_name = "FILE",
            long_help = "Read the selection from a JSON array of entries shaped like scan\n\
records: {\"relative_path\": \"src/main.rs\", \"selected\": true}.\n\n\
Only relative_path and selected are used; sizes, times and absolute paths are\n\
re-read from a fresh scan. Unknown fields are rejected."
        )]
        selection: Option<PathBuf>,

        /// Write the report to FILE instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Show processing statistics on stderr.
        #[arg(long)]
        stats: bool,

        /// Token model for the estimate (cl100k/o200k/heuristic).
        #[arg(long, default_value = "cl100k", value_name = "MODEL")]
        token_model: String,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse().map_err(|e: String| anyhow!(e))?;
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    let config = cli.config()?;
    let resolver = SecureResolver::new(&config)?;

    match cli.command {
        Commands::Browse { path } => {
            let result = resolver.browse(path.as_deref())?;
            let renderer = Renderer::with_config(render_config);
            println!("{}", renderer.render_browse(&result));
            Ok(())
        }

        Commands::Scan { root } => crate::backends::scan::run_scan(&resolver, &root, render_config),

        Commands::Concat {
            root,
            only,
            exclude,
            selection,
            output,
            stats,
            token_model,
        } => {
            let token_model: TokenModel = token_model.parse().map_err(|e: String| anyhow!(e))?;
            let entries = match selection {
                Some(path) => {
                    let text = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read selection {}", path.display()))?;
                    Some(parse_selection(&text)?)
                }
                None => None,
            };

            let opts = ConcatOptions {
                request: SelectionRequest {
                    entries,
                    only,
                    exclude,
                },
                output,
                show_stats: stats,
                token_model,
            };
            run_concat(&resolver, &config, &root, opts, render_config)
        }
    }
}
