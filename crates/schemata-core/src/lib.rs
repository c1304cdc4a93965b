//! Schema model shared by the schemata crates.
//!
//! This crate defines the table/column/key types, the capability traits a
//! reconciler relies on, model validation, and foreign-key dependency
//! ordering.

pub mod constraints;
pub mod error;
pub mod graph;
pub mod model;
pub mod schema;
pub mod types;
pub mod validation;

pub use constraints::{FkAction, FkMatchType, ForeignKey, ForeignKeyOptions, Index, PrimaryKey};
pub use error::{Error, Result};
pub use graph::{FkGraphReport, FkGraphSummary, build_fk_graph_report};
pub use model::{SchemaModel, TableHandle, TableModel, TableRef};
pub use schema::{Column, Schema, Table, TableId};
pub use types::ColumnType;
pub use validation::validate_schema;

/// Current contract version for serialized schema snapshots.
pub const SCHEMA_VERSION: &str = "0.1";
