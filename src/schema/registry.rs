//! Schema Registry
//!
//! Maps schema keywords (`CFG_DEFAULT`, `META_GARDNER_SEQ_BASIC`, ...) to
//! JSON Schema (draft 2020-12) documents.
//!
//! Lookups never fail: an unknown or missing keyword resolves to the
//! permissive `CFG_DEFAULT` schema. Rejecting documents is the validator's
//! job, not the registry's.
//!
//! The registry is built once and shared read-only through
//! [`SchemaRegistry::global`].

use std::collections::HashMap;
use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

static GLOBAL_REGISTRY: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::builtin);

/// Known schema keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    /// Accepts any configuration mapping.
    CfgDefault,
    /// Per-document rules for GLOBAL_CONFIG / RULE_CONFIG streams.
    ///
    /// Single-document configs (`analysis_id`, `workdir`, `rule_params`)
    /// read through [`ConfigHelper`](crate::ConfigHelper) fail this schema;
    /// they use [`CfgGardnerHelper`](SchemaType::CfgGardnerHelper).
    CfgGardnerBasic,
    /// Single-document layout used by [`ConfigHelper`](crate::ConfigHelper).
    CfgGardnerHelper,
    /// Accepts any metadata mapping.
    MetaDefault,
    /// Sequencing metadata: library rows with runs, plus per-rule records.
    MetaGardnerSeqBasic,
}

impl SchemaType {
    pub const ALL: [SchemaType; 5] = [
        SchemaType::CfgDefault,
        SchemaType::CfgGardnerBasic,
        SchemaType::CfgGardnerHelper,
        SchemaType::MetaDefault,
        SchemaType::MetaGardnerSeqBasic,
    ];

    /// Parses a keyword. Returns `None` for unknown keywords.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "CFG_DEFAULT" => Some(SchemaType::CfgDefault),
            "CFG_GARDNER_BASIC" => Some(SchemaType::CfgGardnerBasic),
            "CFG_GARDNER_HELPER" => Some(SchemaType::CfgGardnerHelper),
            "META_DEFAULT" => Some(SchemaType::MetaDefault),
            "META_GARDNER_SEQ_BASIC" => Some(SchemaType::MetaGardnerSeqBasic),
            _ => None,
        }
    }

    /// Resolves an optional keyword, falling back to `CFG_DEFAULT`.
    pub fn resolve(keyword: Option<&str>) -> Self {
        keyword
            .and_then(Self::from_keyword)
            .unwrap_or(SchemaType::CfgDefault)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SchemaType::CfgDefault => "CFG_DEFAULT",
            SchemaType::CfgGardnerBasic => "CFG_GARDNER_BASIC",
            SchemaType::CfgGardnerHelper => "CFG_GARDNER_HELPER",
            SchemaType::MetaDefault => "META_DEFAULT",
            SchemaType::MetaGardnerSeqBasic => "META_GARDNER_SEQ_BASIC",
        }
    }

    fn document(&self) -> Value {
        match self {
            SchemaType::CfgDefault => permissive("permissive schema for any configuration, mostly for dev"),
            SchemaType::CfgGardnerBasic => cfg_gardner_basic(),
            SchemaType::CfgGardnerHelper => cfg_gardner_helper(),
            SchemaType::MetaDefault => permissive("permissive schema for any metadata structure, for dev"),
            SchemaType::MetaGardnerSeqBasic => meta_gardner_seq_basic(),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A named schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    kind: SchemaType,
    document: Value,
}

impl Schema {
    pub fn kind(&self) -> SchemaType {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.keyword()
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

/// Read-only table of the built-in schemas.
#[derive(Debug)]
pub struct SchemaRegistry {
    schemas: HashMap<SchemaType, Schema>,
    fallback: Schema,
}

impl SchemaRegistry {
    /// Returns the process-wide registry.
    pub fn global() -> &'static SchemaRegistry {
        &GLOBAL_REGISTRY
    }

    /// Builds a registry holding every built-in schema.
    pub fn builtin() -> Self {
        let schemas = SchemaType::ALL
            .iter()
            .map(|kind| {
                (
                    *kind,
                    Schema {
                        kind: *kind,
                        document: kind.document(),
                    },
                )
            })
            .collect();

        Self {
            schemas,
            fallback: Schema {
                kind: SchemaType::CfgDefault,
                document: SchemaType::CfgDefault.document(),
            },
        }
    }

    /// Resolves a keyword to a schema; unknown or missing keywords get the
    /// permissive default.
    pub fn get_schema(&self, keyword: Option<&str>) -> &Schema {
        let kind = SchemaType::resolve(keyword);
        if let Some(kw) = keyword.filter(|kw| SchemaType::from_keyword(kw).is_none()) {
            debug!("Unknown schema type '{}', using {}", kw, kind);
        }
        self.schema(kind)
    }

    pub fn schema(&self, kind: SchemaType) -> &Schema {
        self.schemas.get(&kind).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn permissive(description: &str) -> Value {
    json!({
        "$schema": DRAFT_2020_12,
        "description": description,
        "type": "object",
        "properties": {},
        "additionalProperties": true
    })
}

fn resources_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "walltime": {"type": "string"},
            "nodes": {"type": "number"},
            "processors_per_node": {"type": "number"},
            "total_memory": {"type": "number"},
            "log_dir": {"type": "string"},
            "job_id": {"type": "string"}
        },
        "additionalProperties": false,
        "required": [
            "walltime", "nodes", "processors_per_node",
            "total_memory", "log_dir", "job_id"
        ]
    })
}

fn cfg_gardner_basic() -> Value {
    json!({
        "$schema": DRAFT_2020_12,
        "description": "minimum requirements for workflow config documents run on gardner",
        "type": "object",
        "properties": {
            "DOC_TYPE": {"enum": ["GLOBAL_CONFIG", "RULE_CONFIG"]}
        },
        "required": ["DOC_TYPE"],
        "additionalProperties": true,
        "allOf": [
            {
                "if": {
                    "properties": {"DOC_TYPE": {"const": "GLOBAL_CONFIG"}},
                    "required": ["DOC_TYPE"]
                },
                "then": {
                    "properties": {
                        "analysis_name": {"type": "string"},
                        "working_directory": {"type": "string"},
                        "files": {"type": ["object", "null"]}
                    },
                    "required": ["analysis_name", "working_directory", "files"]
                }
            },
            {
                "if": {
                    "properties": {"DOC_TYPE": {"const": "RULE_CONFIG"}},
                    "required": ["DOC_TYPE"]
                },
                "then": {
                    "properties": {
                        "rule_name": {"type": "string"},
                        "parameters": {"type": ["object", "null"]},
                        "resources": resources_schema()
                    },
                    "required": ["rule_name", "resources", "parameters"]
                }
            }
        ]
    })
}

fn cfg_gardner_helper() -> Value {
    json!({
        "$schema": DRAFT_2020_12,
        "description": "minimum requirements for single-document workflow configs run on gardner",
        "type": "object",
        "properties": {
            "analysis_id": {"type": "string"},
            "workdir": {"type": "string"},
            "rule_params": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "rule_name": {"type": "string"},
                        "resources": resources_schema(),
                        "parameters": {
                            "type": "object",
                            "properties": {},
                            "additionalProperties": true
                        }
                    },
                    "additionalProperties": true,
                    "required": ["rule_name", "resources"]
                }
            }
        },
        "required": ["analysis_id", "workdir", "rule_params"],
        "additionalProperties": true
    })
}

fn meta_gardner_seq_basic() -> Value {
    json!({
        "$schema": DRAFT_2020_12,
        "description": "basic schema for sequencing workflow metadata",
        "type": "object",
        "properties": {
            "shared_data": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "library_name": {"type": "string"},
                        "runs": {
                            "type": "array",
                            "items": {"type": "object"}
                        }
                    },
                    "additionalProperties": true,
                    "required": ["library_name", "runs"]
                }
            },
            "rule_data": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "rule_name": {"type": "string"}
                    },
                    "additionalProperties": true,
                    "required": ["rule_name"]
                }
            }
        },
        "additionalProperties": false,
        "required": ["shared_data", "rule_data"]
    })
}
