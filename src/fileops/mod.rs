//! File Operations
//!
//! The thin I/O layer the models sit on: path verification and YAML
//! document reading.
//!
//! - [`paths`]: resolving and verifying filesystem paths
//! - [`yaml`]: reading multi-document YAML streams
//! - [`manifest`]: reading plain text file lists

pub mod manifest;
pub mod paths;
pub mod yaml;

pub use manifest::read_manifest;
pub use paths::{verify_path, verify_path_str, PathKind};
pub use yaml::{parse_documents, read_documents, read_extended_config};
