//! YAML Document Reading
//!
//! Reads `---` separated YAML streams into plain JSON values, which is the
//! form the schema validator and the models consume.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

use super::paths::{verify_path, PathKind};
use crate::error::{DocumentError, Result};

/// Parses every document of a YAML stream.
///
/// Empty documents (a bare `---`) are skipped. `source` is only used in
/// error messages.
pub fn parse_documents(text: &str, source: &str) -> std::result::Result<Vec<Value>, DocumentError> {
    let mut documents = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = Value::deserialize(document).map_err(|source_err| DocumentError::Parse {
            path: source.to_string(),
            index,
            source: source_err,
        })?;

        if value.is_null() {
            debug!("Skipping empty document {} in {}", index, source);
            continue;
        }
        documents.push(value);
    }

    Ok(documents)
}

/// Reads and parses every document of a YAML file.
pub fn read_documents(path: impl AsRef<Path>) -> std::result::Result<Vec<Value>, DocumentError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let text = fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: display.clone(),
        source,
    })?;
    debug!("YAML content loaded ({} bytes)", text.len());

    let documents = parse_documents(&text, &display)?;
    info!("Read {} document(s) from {}", documents.len(), display);
    Ok(documents)
}

/// Reads a file holding a configuration document followed by a metadata
/// document, returning the two in that order.
///
/// The path must point to an existing file.
pub fn read_extended_config(path: &str) -> Result<(Value, Value)> {
    let verified = verify_path(path, PathKind::File, true)?;
    let mut documents = read_documents(&verified)?.into_iter();

    match (documents.next(), documents.next()) {
        (Some(config), Some(metadata)) => Ok((config, metadata)),
        (first, _) => Err(DocumentError::TooFewDocuments {
            path: verified.display().to_string(),
            expected: 2,
            found: usize::from(first.is_some()),
        }
        .into()),
    }
}
