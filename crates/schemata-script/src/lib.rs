//! Declarative reconciliation scripts.
//!
//! A script is a JSON document listing create/define/drop steps for tables
//! and named foreign keys. Scripts are validated (structurally against their
//! JSON Schema, then semantically) and applied through
//! [`schemata_reconcile::Reconciler`].

pub mod apply;
pub mod errors;
pub mod model;
pub mod schema;
pub mod validate;

pub use apply::{ApplyOptions, ApplySummary, apply_script};
pub use errors::{IssueSeverity, Result, ScriptError, ValidationIssue, ValidationReport};
pub use model::{
    ColumnSpec, ColumnTypeSpec, DropForeignKeyStep, DropTableStep, ForeignKeySpec, IndexSpec,
    SCRIPT_VERSION, Script, Step, TableSpec,
};
pub use schema::script_json_schema;
pub use validate::{validate_script, validate_script_document, validate_script_json};
