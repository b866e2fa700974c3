//! Schema Module
//!
//! Built-in JSON Schemas for configuration and metadata documents, and the
//! validation gate every document passes before it is decomposed.
//!
//! - [`registry`]: keyword to schema lookup with a permissive fallback
//! - [`validator`]: all-or-nothing document validation

pub mod registry;
pub mod validator;

pub use registry::{Schema, SchemaRegistry, SchemaType};
pub use validator::{is_valid, validate, validate_with};
