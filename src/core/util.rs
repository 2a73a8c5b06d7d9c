//! Common utilities

use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::time::SystemTime;

/// Modification time of a file, or the Unix epoch if the platform has none
pub fn modified_at(metadata: &Metadata) -> DateTime<Utc> {
    let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    DateTime::<Utc>::from(mtime)
}

/// Timestamp used in report headers
pub fn report_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Human-readable byte count (B, KB, MB, GB)
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}
