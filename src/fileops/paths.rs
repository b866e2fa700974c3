//! Path Verification
//!
//! Turns a candidate path string into an absolute path and optionally checks
//! that an object of the expected kind exists there.

use std::env;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use log::debug;

use crate::error::PathVerificationError;

/// What kind of filesystem object a path should point to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
    /// Anything that exists.
    Unknown,
}

impl PathKind {
    /// Parses a kind keyword (case-insensitive).
    ///
    /// Accepted: `dir`, `directory`, `folder`, `file`, `fp`, `unknown`.
    pub fn parse(path: &str, keyword: &str) -> Result<Self, PathVerificationError> {
        keyword
            .parse()
            .map_err(|_| PathVerificationError::UnknownKind {
                path: path.to_string(),
                kind: keyword.to_string(),
            })
    }

    fn matches(&self, path: &Path) -> bool {
        match self {
            PathKind::File => path.is_file(),
            PathKind::Directory => path.is_dir(),
            PathKind::Unknown => path.exists(),
        }
    }
}

impl FromStr for PathKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dir" | "directory" | "folder" => Ok(PathKind::Directory),
            "file" | "fp" => Ok(PathKind::File),
            "unknown" => Ok(PathKind::Unknown),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::File => write!(f, "file"),
            PathKind::Directory => write!(f, "directory"),
            PathKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Resolves `candidate` to an absolute path.
///
/// A leading `~` is expanded from `HOME`. Relative paths are joined onto the
/// current directory and normalised; existing paths are canonicalised so
/// symlinks are resolved. With `require_exists`, fails unless an object of
/// `kind` exists at the resolved location.
pub fn verify_path(
    candidate: &str,
    kind: PathKind,
    require_exists: bool,
) -> Result<PathBuf, PathVerificationError> {
    let resolved = resolve(candidate)?;
    debug!("Resolved '{}' to {}", candidate, resolved.display());

    if require_exists && !kind.matches(&resolved) {
        return Err(PathVerificationError::NotFound {
            path: resolved,
            kind: kind.to_string(),
        });
    }

    Ok(resolved)
}

/// Like [`verify_path`] but takes the kind as a keyword.
pub fn verify_path_str(
    candidate: &str,
    kind: &str,
    require_exists: bool,
) -> Result<PathBuf, PathVerificationError> {
    let kind = PathKind::parse(candidate, kind)?;
    verify_path(candidate, kind, require_exists)
}

fn resolve(candidate: &str) -> Result<PathBuf, PathVerificationError> {
    let expanded = expand_home(candidate);

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = env::current_dir().map_err(|source| PathVerificationError::Io {
            path: candidate.to_string(),
            source,
        })?;
        cwd.join(expanded)
    };

    let normalized = normalize(&absolute);
    match normalized.canonicalize() {
        Ok(canonical) => Ok(canonical),
        Err(_) => Ok(normalized),
    }
}

fn expand_home(candidate: &str) -> PathBuf {
    let home = env::var_os("HOME").map(PathBuf::from);
    match (candidate, home) {
        ("~", Some(home)) => home,
        (c, Some(home)) if c.starts_with("~/") => home.join(&c[2..]),
        (c, _) => PathBuf::from(c),
    }
}

/// Removes `.` and folds `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
