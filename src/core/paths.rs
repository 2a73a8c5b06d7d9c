//! Path normalization utilities
//!
//! Relative paths are normalized to use '/' as separator so that ordering and
//! headers are identical on every platform.

use std::path::Path;

/// Use '/' as separator (for cross-platform consistency)
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Make a path relative to the root directory.
///
/// `None` when `path` is not under `root` or the relative part is not valid
/// UTF-8, so distinct files never share a relative path.
pub fn make_relative(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()?
        .to_str()
        .map(normalize_separators)
}

/// Leaf name of a path, lossily converted
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether `path` equals `root` or lies beneath it (component-wise)
pub fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize_separators("src\\core\\mod.rs"), "src/core/mod.rs");
        assert_eq!(normalize_separators("src/main.rs"), "src/main.rs");
    }

    #[test]
    fn test_make_relative() {
        let root = Path::new("/project");
        let path = Path::new("/project/src/main.rs");
        assert_eq!(make_relative(path, root), Some("src/main.rs".to_string()));
    }

    #[test]
    fn test_make_relative_not_under_root() {
        let root = Path::new("/project");
        let path = Path::new("/other/file.rs");
        assert_eq!(make_relative(path, root), None);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Path::new("/a/b/.env")), ".env");
        assert_eq!(file_name(Path::new("/")), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_make_relative_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = Path::new("/project");
        let path = root.join(OsStr::from_bytes(b"caf\xe9.txt"));
        assert_eq!(make_relative(&path, root), None);
    }

    #[test]
    fn test_is_within_is_component_wise() {
        assert!(is_within(Path::new("/data/projects/sub"), Path::new("/data/projects")));
        assert!(is_within(Path::new("/data/projects"), Path::new("/data/projects")));
        // A shared string prefix is not containment
        assert!(!is_within(Path::new("/data/projects2"), Path::new("/data/projects")));
    }
}
