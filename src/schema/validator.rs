//! Schema Validation Gate
//!
//! Documents pass through [`validate`] before they are decomposed into typed
//! records. Validation is all-or-nothing: the document comes back unchanged,
//! or every violation is reported at once.

use log::{debug, info};
use serde_json::Value;

use super::registry::Schema;
use crate::error::{SchemaValidationError, Violation, Violations};

/// Validates `document` against `schema`, returning it unchanged on success.
///
/// `label` names the document in logs and errors (e.g. `"config"` or
/// `"metadata"`). On failure the error carries snapshots of both the
/// document and the schema.
pub fn validate(
    document: Value,
    schema: &Schema,
    label: &str,
) -> Result<Value, SchemaValidationError> {
    validate_with(document, schema, label, false)
}

/// Same as [`validate`], but skips the success log line when `quiet` is set.
pub fn validate_with(
    document: Value,
    schema: &Schema,
    label: &str,
    quiet: bool,
) -> Result<Value, SchemaValidationError> {
    let violations = check(&document, schema)?;

    if !violations.is_empty() {
        debug!(
            "'{}' failed {} with {} violation(s)",
            label,
            schema.name(),
            violations.len()
        );
        return Err(SchemaValidationError::Invalid {
            label: label.to_string(),
            schema_name: schema.name().to_string(),
            document: Box::new(document),
            schema: Box::new(schema.document().clone()),
            violations,
        });
    }

    if !quiet {
        info!("Successfully validated {}", label);
    }
    Ok(document)
}

/// Returns true if `document` conforms to `schema`.
pub fn is_valid(document: &Value, schema: &Schema) -> bool {
    matches!(check(document, schema), Ok(v) if v.is_empty())
}

fn check(document: &Value, schema: &Schema) -> Result<Violations, SchemaValidationError> {
    let validator = jsonschema::validator_for(schema.document()).map_err(|e| {
        SchemaValidationError::Compile {
            schema_name: schema.name().to_string(),
            reason: e.to_string(),
        }
    })?;

    let violations = validator
        .iter_errors(document)
        .map(|e| Violation {
            instance_path: e.instance_path.to_string(),
            schema_path: e.schema_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    Ok(Violations(violations))
}
