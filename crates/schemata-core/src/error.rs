use thiserror::Error;

use crate::schema::TableId;

/// Core error type shared across schemata crates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// No table with the given name exists in the schema.
    #[error("table not found: {0}")]
    TableNotFound(String),
    /// A table with the given name is already present.
    #[error("table already exists: {0}")]
    TableAlreadyExists(String),
    /// A handle points at a table instance that was dropped or replaced.
    #[error("stale table handle: {name} (id {id})")]
    StaleTable { name: String, id: TableId },
    #[error("column not found: {table}.{column}")]
    ColumnNotFound { table: String, column: String },
    #[error("duplicate column name: {table}.{column}")]
    DuplicateColumn { table: String, column: String },
    #[error("foreign key not found: {table}.{name}")]
    ForeignKeyNotFound { table: String, name: String },
    #[error("duplicate foreign key name: {table}.{name}")]
    DuplicateForeignKey { table: String, name: String },
    /// The table declares no primary key.
    #[error("table has no primary key: {0}")]
    NoPrimaryKey(String),
    /// A foreign key definition is malformed (empty or mismatched column lists).
    #[error("invalid foreign key {name}: {reason}")]
    InvalidForeignKey { name: String, reason: String },
    /// The schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Catch-all error for failures raised by definition callbacks.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by schemata crates.
pub type Result<T> = std::result::Result<T, Error>;
