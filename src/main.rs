//! filecat - File discovery, classification and concatenation for LLM prompts
//!
//! filecat provides:
//! - Directory browsing confined to a set of allowed roots
//! - Scanning that skips hidden, binary and dependency/VCS content
//! - Concurrent, order-preserving concatenation into a single report
//! - Unified output format (jsonl/json/md)

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backends;
mod cli;
mod core;
mod flows;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("filecat={}", cli.log_level())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    cli::run(cli)
}
