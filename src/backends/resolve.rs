//! Secure path resolution and directory browsing
//!
//! Every browse or scan target is canonicalized (symlinks and `..` resolved
//! by the filesystem) and must equal or descend from one of the allowed
//! roots. Nothing here ever corrects a bad request to a different path.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::core::config::Config;
use crate::core::error::{FilecatError, Result};
use crate::core::model::{Breadcrumb, BrowseEntry, BrowseResult};
use crate::core::paths::{file_name, is_within};

/// A directory that passed resolution.
///
/// Only [`SecureResolver::resolve_root`] creates one, so holding a value
/// proves the path is canonical, existing, and inside the allowed roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoot(PathBuf);

impl ResolvedRoot {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct SecureResolver {
    /// Canonical allowed roots, in configured order
    roots: Vec<PathBuf>,
}

impl SecureResolver {
    /// Canonicalize the configured roots. Roots that do not exist are dropped
    /// with a warning; if none survive the configuration is rejected.
    pub fn new(config: &Config) -> Result<Self> {
        let mut roots = Vec::new();
        for root in config.effective_roots()? {
            match root.canonicalize() {
                Ok(canonical) => {
                    if !roots.contains(&canonical) {
                        roots.push(canonical);
                    }
                }
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "Ignoring allowed root");
                }
            }
        }

        if roots.is_empty() {
            return Err(FilecatError::InvalidConfig(
                "none of the allowed roots exist".to_string(),
            ));
        }

        debug!(roots = ?roots, "Allowed roots");
        Ok(Self { roots })
    }

    /// The most specific allowed root containing `canonical`
    fn containing_root(&self, canonical: &Path) -> Option<&Path> {
        self.roots
            .iter()
            .filter(|root| is_within(canonical, root))
            .max_by_key(|root| root.components().count())
            .map(PathBuf::as_path)
    }

    /// Canonicalize `requested` and check it against the allowed roots.
    ///
    /// A path that does not exist is resolved component by component so
    /// that an escaping request is still reported as denied.
    pub fn resolve(&self, requested: &Path) -> Result<PathBuf> {
        match requested.canonicalize() {
            Ok(canonical) => {
                if self.containing_root(&canonical).is_some() {
                    Ok(canonical)
                } else {
                    debug!(requested = %requested.display(), canonical = %canonical.display(), "Path denied");
                    Err(FilecatError::PathDenied { path: canonical })
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let absolute =
                    std::path::absolute(requested).map_err(|e| FilecatError::io(requested, e))?;
                let resolved = resolve_missing(&absolute);
                if self.containing_root(&resolved).is_some() {
                    Err(FilecatError::RootNotFound { path: resolved })
                } else {
                    Err(FilecatError::PathDenied { path: resolved })
                }
            }
            Err(e) => Err(FilecatError::io(requested, e)),
        }
    }

    /// Resolve a scan root: it must exist and be a directory
    pub fn resolve_root(&self, requested: &Path) -> Result<ResolvedRoot> {
        let canonical = self.resolve(requested)?;
        if !canonical.is_dir() {
            return Err(FilecatError::NotADirectory { path: canonical });
        }
        Ok(ResolvedRoot(canonical))
    }

    /// List the child directories of `requested` (or of the first allowed
    /// root when `None`), with parent and breadcrumbs that never leave the
    /// allowed roots.
    pub fn browse(&self, requested: Option<&Path>) -> Result<BrowseResult> {
        let current = match requested {
            Some(path) => self.resolve(path).map_err(|e| match e {
                FilecatError::RootNotFound { path } => FilecatError::NotADirectory { path },
                other => other,
            })?,
            None => self.roots[0].clone(),
        };

        if !current.is_dir() {
            return Err(FilecatError::NotADirectory { path: current });
        }

        let root = self
            .containing_root(&current)
            .ok_or_else(|| FilecatError::PathDenied {
                path: current.clone(),
            })?;

        let parent_path = if self.roots.iter().any(|r| r == &current) {
            None
        } else {
            current.parent().map(Path::to_path_buf)
        };

        Ok(BrowseResult {
            breadcrumbs: breadcrumbs(root, &current),
            directories: list_directories(&current),
            parent_path,
            current_path: current,
        })
    }
}

/// Resolve a path whose tail does not exist.
///
/// Components are applied left to right and the result is canonicalized
/// after each one while it still exists, so a `..` following a symlink
/// leaves the symlink's target, not the link's directory.
fn resolve_missing(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                if let Ok(canonical) = resolved.canonicalize() {
                    resolved = canonical;
                }
            }
        }
    }
    resolved
}

/// Chain from `root` down to `current`, both inclusive
fn breadcrumbs(root: &Path, current: &Path) -> Vec<Breadcrumb> {
    let root_name = match file_name(root) {
        name if name.is_empty() => root.display().to_string(),
        name => name,
    };
    let mut chain = vec![Breadcrumb {
        name: root_name,
        path: root.to_path_buf(),
    }];

    let mut path = root.to_path_buf();
    if let Ok(rest) = current.strip_prefix(root) {
        for component in rest.components() {
            path.push(component);
            chain.push(Breadcrumb {
                name: component.as_os_str().to_string_lossy().into_owned(),
                path: path.clone(),
            });
        }
    }

    chain
}

/// Child directories sorted by name. Symlinks are not followed, so a listed
/// entry can never point outside the current directory.
fn list_directories(dir: &Path) -> Vec<BrowseEntry> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Cannot list directory");
            return Vec::new();
        }
    };

    let mut directories: Vec<BrowseEntry> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            BrowseEntry {
                hidden: crate::core::classify::is_hidden(&name),
                path: entry.path(),
                name,
            }
        })
        .collect();

    directories.sort_by(|a, b| a.name.cmp(&b.name));
    directories
}
