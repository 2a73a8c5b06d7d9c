//! Path classification predicates
//!
//! Hidden names, noise directories and a best-effort binary/text heuristic.
//! The binary check is a heuristic: it reads at most the first 1024 bytes and
//! treats anything it cannot read as binary. None of these functions touch
//! shared state, so workers may call them concurrently.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected by [`is_probably_binary`]
pub const SNIFF_LEN: usize = 1024;

/// Virtual-environment, cache, version-control and dependency directories
static EXCLUDED_DIRS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        ".venv",
        "venv",
        "env",
        "__pycache__",
        ".mypy_cache",
        ".pytest_cache",
        ".tox",
        ".git",
        ".svn",
        ".hg",
        "node_modules",
    ]
    .into_iter()
    .collect()
});

/// Extensions known to hold text even when the MIME table disagrees
/// (`.ts` maps to `video/mp2t`, for example)
static TEXT_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "py", "txt", "md", "rst", "html", "htm", "css", "scss", "js", "jsx", "mjs", "cjs", "ts",
        "tsx", "java", "kt", "go", "rs", "c", "h", "cc", "cpp", "hpp", "cs", "rb", "php", "pl",
        "swift", "scala", "lua", "json", "xml", "yaml", "yml", "toml", "ini", "cfg", "conf",
        "log", "env", "example", "gitignore", "dockerfile", "sql", "sh", "bash", "zsh", "bat",
        "ps1", "lock", "csv", "tsv", "svg",
    ]
    .into_iter()
    .collect()
});

/// File names (lowercased) that are text regardless of extension
static TEXT_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "readme",
        "license",
        "dockerfile",
        "makefile",
        "changelog",
        "authors",
    ]
    .into_iter()
    .collect()
});

/// Textual subtypes under the `application/` top-level type
const TEXTUAL_APPLICATION_SUBTYPES: &[&str] = &[
    "json",
    "javascript",
    "ecmascript",
    "xml",
    "x-sh",
    "x-shellscript",
    "x-csh",
    "toml",
    "x-toml",
    "yaml",
    "x-yaml",
    "sql",
    "x-python",
    "x-perl",
    "x-ruby",
    "x-httpd-php",
    "x-tex",
    "x-latex",
    "graphql",
    "x-ndjson",
];

/// True iff the leaf name starts with a dot
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// True iff the directory name is a known noise directory or is hidden
pub fn is_excluded_directory(name: &str) -> bool {
    is_hidden(name) || EXCLUDED_DIRS.contains(name.to_lowercase().as_str())
}

/// Whether the name or extension is on the text allow-list
fn is_known_text_name(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if TEXT_EXTENSIONS.contains(ext.to_lowercase().as_str()) {
            return true;
        }
    }

    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| TEXT_NAMES.contains(stem.to_lowercase().as_str()))
}

/// Whether the extension maps to a MIME type that is not text
fn has_binary_mime(path: &Path) -> bool {
    let Some(mime) = mime_guess::from_path(path).first() else {
        return false;
    };

    if mime.type_().as_str() == "text" {
        return false;
    }

    if let Some(suffix) = mime.suffix() {
        if matches!(suffix.as_str(), "json" | "xml") {
            return false;
        }
    }

    !(mime.type_().as_str() == "application"
        && TEXTUAL_APPLICATION_SUBTYPES.contains(&mime.subtype().as_str()))
}

/// Whether the sniffed prefix decodes as UTF-8.
///
/// A multi-byte sequence cut off by the sniff window is not a failure.
fn decodes_as_utf8(prefix: &[u8]) -> bool {
    match std::str::from_utf8(prefix) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

/// Read up to [`SNIFF_LEN`] bytes from the start of the file
fn read_prefix(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut prefix)?;
    Ok(prefix)
}

/// Heuristic binary classification.
///
/// In order, first match wins:
/// 1. a non-text MIME type for the extension (allow-listed names skip this)
/// 2. a null byte in the first 1024 bytes
/// 3. the first 1024 bytes fail to decode as UTF-8, or cannot be read
pub fn is_probably_binary(path: &Path) -> bool {
    if !is_known_text_name(path) && has_binary_mime(path) {
        return true;
    }

    let prefix = match read_prefix(path) {
        Ok(p) => p,
        Err(_) => return true,
    };

    if prefix.contains(&0) {
        return true;
    }

    !decodes_as_utf8(&prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(".git"));
        assert!(is_hidden(".env"));
        assert!(!is_hidden("src"));
        assert!(!is_hidden("main.rs"));
        assert!(!is_hidden(""));
    }

    #[test]
    fn test_is_excluded_directory() {
        assert!(is_excluded_directory("node_modules"));
        assert!(is_excluded_directory("__pycache__"));
        assert!(is_excluded_directory("venv"));
        assert!(is_excluded_directory("env"));
        assert!(is_excluded_directory(".git"));
        assert!(!is_excluded_directory("src"));
        assert!(!is_excluded_directory("environment"));
    }

    #[test]
    fn test_is_excluded_directory_case_insensitive() {
        assert!(is_excluded_directory("Node_Modules"));
        assert!(is_excluded_directory("VENV"));
    }

    #[test]
    fn test_hidden_directory_is_excluded() {
        assert!(is_excluded_directory(".cache"));
        assert!(is_excluded_directory(".idea"));
    }

    #[test]
    fn test_null_byte_is_binary_despite_text_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello\x00world").unwrap();
        assert!(is_probably_binary(&path));
    }

    #[test]
    fn test_utf8_with_unknown_extension_is_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.zzqx");
        fs::write(&path, "plain words, caf\u{e9}\n").unwrap();
        assert!(!is_probably_binary(&path));
    }

    #[test]
    fn test_binary_mime_short_circuits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logo.png");
        fs::write(&path, "not really an image").unwrap();
        assert!(is_probably_binary(&path));
    }

    #[test]
    fn test_typescript_is_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.ts");
        fs::write(&path, "export const x: number = 1;\n").unwrap();
        assert!(!is_probably_binary(&path));
    }

    #[test]
    fn test_json_is_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, "{\"name\": \"x\"}").unwrap();
        assert!(!is_probably_binary(&path));
    }

    #[test]
    fn test_invalid_utf8_is_binary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, [0x48, 0x69, 0xFF, 0xFE, 0x21]).unwrap();
        assert!(is_probably_binary(&path));
    }

    #[test]
    fn test_multibyte_char_cut_by_window_is_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.md");
        // 1023 ASCII bytes then a 3-byte char straddling the window
        let mut content = "a".repeat(SNIFF_LEN - 1);
        content.push('你');
        fs::write(&path, content).unwrap();
        assert!(!is_probably_binary(&path));
    }

    #[test]
    fn test_unreadable_is_binary() {
        assert!(is_probably_binary(Path::new("/nonexistent/file.txt")));
    }

    #[test]
    fn test_special_names_are_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Makefile");
        fs::write(&path, "all:\n\techo hi\n").unwrap();
        assert!(!is_probably_binary(&path));
    }

    #[test]
    fn test_empty_file_is_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "").unwrap();
        assert!(!is_probably_binary(&path));
    }
}
