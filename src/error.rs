//! Error Types
//!
//! One error type per failure kind, plus a crate-wide [`Error`] that wraps
//! them so callers can either match on the specific kind or propagate with `?`.
//!
//! Every error carries the context needed to diagnose it without re-running:
//! the offending source, document, rule name, key or path.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::diagnostics;

/// A single schema violation reported by the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// JSON Pointer to the violating field in the document.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that rejected it.
    pub schema_path: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Newline-separated list of violations, used in error messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A document failed the schema gate.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document does not conform to the schema.
    #[error("validation of '{label}' failed against schema '{schema_name}':\n{violations}")]
    Invalid {
        label: String,
        schema_name: String,
        /// Snapshot of the rejected document.
        document: Box<Value>,
        /// Snapshot of the schema it was checked against.
        schema: Box<Value>,
        violations: Violations,
    },

    /// The schema itself could not be compiled.
    #[error("schema '{schema_name}' could not be compiled: {reason}")]
    Compile { schema_name: String, reason: String },
}

/// A configuration stream could not be turned into a [`Configuration`](crate::Configuration).
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("{section} document in '{source_name}' is missing required keys {missing:?} (include them even if empty)")]
    MissingKeys {
        section: &'static str,
        source_name: String,
        missing: Vec<String>,
        document: Box<Value>,
    },

    #[error("document {index} in '{source_name}' has DOC_TYPE {found:?}; expected one of GLOBAL_CONFIG, RULE_CONFIG at the top level")]
    UnknownDocType {
        source_name: String,
        index: usize,
        found: Option<String>,
        document: Box<Value>,
    },

    #[error("document {index} in '{source_name}' is not a mapping")]
    NotAMapping { source_name: String, index: usize },

    #[error("'{key}' in document {index} of '{source_name}' must be a mapping")]
    SectionNotMapping {
        source_name: String,
        index: usize,
        key: String,
    },

    #[error("rule_name in document {index} of '{source_name}' must be a string")]
    RuleNameNotString { source_name: String, index: usize },

    #[error("'{source_name}' contains more than one GLOBAL_CONFIG document (documents {first} and {second})")]
    DuplicateGlobal {
        source_name: String,
        first: usize,
        second: usize,
    },
}

/// A rule name was not found among the loaded rules.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("could not find rule with name '{rule_name}' (known rules: {known:?})")]
pub struct RuleLookupError {
    pub rule_name: String,
    pub known: Vec<String>,
}

/// A named parameter is missing from a [`ConfigHelper`](crate::ConfigHelper).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("global parameter '{param}' could not be found in the configuration")]
    Global { param: String },

    #[error("{rule}:{param} -> could not find entry in configuration")]
    Rule { rule: String, param: String },
}

/// A nested key lookup ran past the end of the data.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("rule '{rule_name}': key path {path:?} could not be resolved at segment '{segment}'")]
pub struct KeyPathError {
    pub rule_name: String,
    pub path: Vec<String>,
    /// First segment that did not resolve.
    pub segment: String,
}

/// Raised by the path collaborator.
#[derive(Error, Debug)]
pub enum PathVerificationError {
    #[error("unknown path type '{kind}' for {path}; must be one of: unknown, dir, directory, folder, file, fp")]
    UnknownKind { path: String, kind: String },

    #[error("unable to validate that {} of type '{kind}' exists", path.display())]
    NotFound { path: PathBuf, kind: String },

    #[error("could not resolve {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A query over the shared data relation could not be answered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataQueryError {
    #[error("column '{column}' does not exist in {table}")]
    UnknownColumn { table: String, column: String },

    #[error("shared_data is malformed: {reason}")]
    InvalidSharedData { reason: String },

    #[error("rule_data is malformed: {reason}")]
    InvalidRuleData { reason: String },

    #[error("column '{column}' already exists and cannot hold the join indicator")]
    IndicatorConflict { column: String },

    #[error("joined table would hold column '{column}' twice")]
    ColumnConflict { column: String },
}

/// A YAML source could not be read or parsed.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML document {index} of '{path}': {source}")]
    Parse {
        path: String,
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("'{path}' holds {found} document(s); expected at least {expected}")]
    TooFewDocuments {
        path: String,
        expected: usize,
        found: usize,
    },
}

/// Any failure produced by this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    #[error(transparent)]
    ConfigLoad(#[from] ConfigLoadError),

    #[error(transparent)]
    RuleLookup(#[from] RuleLookupError),

    #[error(transparent)]
    KeyPath(#[from] KeyPathError),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Path(#[from] PathVerificationError),

    #[error(transparent)]
    DataQuery(#[from] DataQueryError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Short heading used when the error is reported on stderr.
    pub fn prelude(&self) -> &'static str {
        match self {
            Error::Schema(_) => "Error! Could not validate YAML data against its schema",
            Error::ConfigLoad(_) => "Error! Cannot properly load YAML config",
            Error::RuleLookup(_) | Error::KeyPath(_) | Error::Param(_) => {
                "Error! Inappropriate access attempt on rule parameters"
            }
            Error::Path(_) => "Error! Path verification failed",
            Error::DataQuery(_) => "Error! Invalid query on shared data",
            Error::Document(_) => "Error! Cannot read YAML source",
        }
    }

    /// Prints the error to stderr, including document and schema snapshots
    /// for validation failures.
    pub fn report(&self) {
        diagnostics::eprint_error(self.prelude(), &self.to_string());
        if let Error::Schema(SchemaValidationError::Invalid {
            document, schema, ..
        }) = self
        {
            diagnostics::eprint_value("Passed attributes", document);
            diagnostics::eprint_value("Schema format", schema);
        }
    }
}
