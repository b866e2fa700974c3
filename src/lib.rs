//! gardnersnake - Workflow Configuration and Metadata
//!
//! Schema-checked access to the configuration and metadata documents that
//! drive a snakemake-style bioinformatics pipeline. Rules look up their
//! parameters, resources and input files by rule name and key path instead
//! of indexing raw YAML.
//!
//! # Architecture
//!
//! - [`schema`]: Schema registry and validation gate
//! - [`attrdict`]: Nested key/value container for free-form sections
//! - [`config`]: Global and per-rule parameters
//! - [`data`]: Shared sample table and per-rule metadata
//! - [`fileops`]: YAML reading, path verification and manifests
//!
//! # Example
//!
//! ```rust,no_run
//! use gardnersnake::{Configuration, DataManager, SchemaType};
//! use gardnersnake::fileops::read_documents;
//!
//! fn main() -> gardnersnake::Result<()> {
//!     gardnersnake::logging::init_logging(false);
//!
//!     let config = Configuration::new("config.yaml")
//!         .with_schema(SchemaType::CfgGardnerBasic)
//!         .load()?;
//!     let align = config.get_rule_params("align_reads")?;
//!     println!("threads: {}", align.parameters["threads"]);
//!
//!     let metadata = read_documents("metadata.yaml")?.remove(0);
//!     let data = DataManager::new(metadata, Some("META_GARDNER_SEQ_BASIC"))?;
//!     let fastq = data.get_shared_data([("library_name", "L1")], "fastq1")?;
//!     println!("fastq1: {:?}", fastq);
//!     Ok(())
//! }
//! ```

pub mod attrdict;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod fileops;
pub mod logging;
pub mod schema;

// Re-export commonly used types
pub use attrdict::{AttrDict, Node};
pub use config::{ConfigHelper, Configuration, GlobalParams, RuleParams};
pub use data::{DataManager, SharedTable, SharedValue};
pub use error::{Error, Result};
pub use fileops::{verify_path, PathKind};
pub use schema::{validate, SchemaRegistry, SchemaType};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const APP_NAME: &str = "gardnersnake";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "gardnersnake");
    }

    #[test]
    fn test_module_exports_attrdict() {
        let dict = AttrDict::from_value(json!({"a": {"b": 1}})).unwrap();
        assert_eq!(dict["a"]["b"], 1);
    }

    #[test]
    fn test_module_exports_registry() {
        let schema = SchemaRegistry::global().get_schema(Some("NOT_A_SCHEMA"));
        assert_eq!(schema.kind(), SchemaType::CfgDefault);
    }
}
