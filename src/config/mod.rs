//! Workflow Configuration Module
//!
//! Global and per-rule parameters for a workflow, loaded from YAML and
//! checked against a schema before use.
//!
//! # Structure
//!
//! - [`model`]: Typed records (GlobalParams, RuleParams, DocType)
//! - [`configuration`]: Multi-document loading and rule lookup
//! - [`helper`]: Accessors for single-document configurations

pub mod configuration;
pub mod helper;
pub mod model;

pub use configuration::Configuration;
pub use helper::ConfigHelper;
pub use model::{parse_walltime, DocType, GlobalParams, RuleParams};
