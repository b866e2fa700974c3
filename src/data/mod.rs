//! Workflow Metadata Module
//!
//! Shared sample/library/run records and per-rule metadata, loaded from a
//! validated metadata document.
//!
//! # Structure
//!
//! - [`table`]: The shared data relation (filter, project, left outer join)
//! - [`manager`]: Rule-data lookup and shared data queries

pub mod manager;
pub mod table;

pub use manager::{DataManager, SharedValue};
pub use table::{MergeIndicator, SharedTable, INDICATOR_COLUMN};
