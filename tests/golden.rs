//! Golden tests for filecat
//!
//! These tests run the binary against the checked-in sample project and
//! compare the output with the expected inventory and report text.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::PathBuf;

/// Get the path to the fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get the path to the sample project
fn sample_project() -> PathBuf {
    fixtures_dir().join("sample_project")
}

/// Create a command confined to the fixtures directory
fn filecat_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("filecat"));
    cmd.env_remove("RUST_LOG")
        .env_remove("FILECAT_WORKERS")
        .env_remove("FILECAT_MAX_FILE_SIZE")
        .arg("--allowed-roots")
        .arg(fixtures_dir());
    cmd
}

/// Parse JSONL output into a vector of JSON values
fn parse_jsonl(output: &str) -> Vec<Value> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str::<Value>(l).ok())
        .collect()
}

const EXPECTED_BODY: &str = "\n\
\n### README.md ###\n# Sample Project\n\nA tiny tree used by the golden tests.\n\n\n\
\n### notes/todo.txt ###\n- write docs\n- ship it\n\n\n\
\n### src/main.rs ###\nfn main() {\n    println!(\"Hello from sample project!\");\n}\n\n\n";

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Scan Tests ====================

    #[test]
    fn test_scan_inventory() {
        let output = filecat_cmd()
            .arg("scan")
            .arg(sample_project())
            .output()
            .unwrap();
        assert!(output.status.success());

        let lines = parse_jsonl(&String::from_utf8_lossy(&output.stdout));
        let files: Vec<&str> = lines
            .iter()
            .filter(|l| l["kind"] == "file")
            .map(|l| l["relative_path"].as_str().unwrap())
            .collect();
        assert_eq!(files, vec!["README.md", "notes/todo.txt", "src/main.rs"]);
    }

    #[test]
    fn test_scan_statistics() {
        let output = filecat_cmd()
            .arg("scan")
            .arg(sample_project())
            .output()
            .unwrap();
        let lines = parse_jsonl(&String::from_utf8_lossy(&output.stdout));
        let stats = lines.last().unwrap();

        assert_eq!(stats["kind"], "stats");
        assert_eq!(stats["total_files_seen"], 5);
        assert_eq!(stats["files_included"], 3);
        assert_eq!(stats["files_skipped"], 2);
        assert_eq!(stats["per_reason_counts"]["hidden"], 1);
        assert_eq!(stats["per_reason_counts"]["binary"], 1);
        assert_eq!(stats["per_reason_counts"]["excluded_directory"], 2);
        assert!(stats["errors"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_scan_record_fields() {
        let output = filecat_cmd()
            .arg("scan")
            .arg(sample_project())
            .output()
            .unwrap();
        let lines = parse_jsonl(&String::from_utf8_lossy(&output.stdout));
        let readme = &lines[0];

        assert_eq!(readme["size_bytes"], 56);
        assert_eq!(readme["selected"], true);
        assert!(readme["modified_at"].is_string());
        assert!(readme["absolute_path"]
            .as_str()
            .unwrap()
            .ends_with("sample_project/README.md"));
    }

    #[test]
    fn test_scan_markdown() {
        filecat_cmd()
            .arg("--format")
            .arg("md")
            .arg("scan")
            .arg(sample_project())
            .assert()
            .success()
            .stdout(predicate::str::contains("## Files"))
            .stdout(predicate::str::contains("- `notes/todo.txt` (23 B)"))
            .stdout(predicate::str::contains("- Included: 3"));
    }

    // ==================== Concat Tests ====================

    #[test]
    fn test_concat_report_body() {
        let output = filecat_cmd()
            .arg("concat")
            .arg(sample_project())
            .output()
            .unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).unwrap();
        let mut lines = stdout.lines();
        assert_eq!(lines.next(), Some("# File Concatenation for LLM Processing"));
        assert!(lines.next().unwrap().starts_with("# Generated: "));
        assert!(lines.next().unwrap().starts_with("# Source Directory: "));
        assert_eq!(lines.next(), Some("# Total Files Selected: 3"));

        let (_, body) = stdout
            .split_once("# ================================================\n")
            .unwrap();
        assert_eq!(body, EXPECTED_BODY);
    }

    #[test]
    fn test_concat_stats_markdown() {
        filecat_cmd()
            .arg("--format")
            .arg("md")
            .arg("concat")
            .arg(sample_project())
            .arg("--stats")
            .assert()
            .success()
            .stderr(predicate::str::contains("## Processing Statistics"))
            .stderr(predicate::str::contains("- Concatenated: 3"))
            .stderr(predicate::str::contains("- Method: parallel (3 workers)"));
    }

    // ==================== Browse Tests ====================

    #[test]
    fn test_browse_sample_project() {
        let output = filecat_cmd()
            .arg("browse")
            .arg(sample_project())
            .output()
            .unwrap();
        assert!(output.status.success());

        let result: Value = serde_json::from_slice(&output.stdout).unwrap();
        let names: Vec<&str> = result["directories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["__pycache__", "assets", "node_modules", "notes", "src"]
        );

        let crumbs: Vec<&str> = result["breadcrumbs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(crumbs, vec!["fixtures", "sample_project"]);
    }

    #[test]
    fn test_browse_above_root_is_denied() {
        filecat_cmd()
            .arg("browse")
            .arg(fixtures_dir().join(".."))
            .assert()
            .failure()
            .stderr(predicate::str::contains("outside the allowed roots"));
    }
}
