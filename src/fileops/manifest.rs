//! File manifests: plain text files listing one path per line.

use std::fs;
use std::path::Path;

use crate::error::DocumentError;

/// Returns the trimmed, non-blank lines of a manifest file.
pub fn read_manifest(path: impl AsRef<Path>) -> Result<Vec<String>, DocumentError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.display().to_string(),
        source,
    })?;

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
