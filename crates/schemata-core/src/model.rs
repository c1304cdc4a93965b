//! Capability contract between a schema model and code that reconciles it.
//!
//! [`crate::Schema`] and [`crate::Table`] are the in-tree implementation;
//! other models can plug into the reconciler by implementing these traits.

use std::fmt;

use crate::constraints::{ForeignKey, ForeignKeyOptions};
use crate::error::{Error, Result};
use crate::schema::{Schema, Table, TableId};

/// Token naming one specific table instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableHandle {
    id: TableId,
    name: String,
}

impl TableHandle {
    pub fn new(id: TableId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A table argument given either by name or by handle.
///
/// Names resolve through lookup and fail when absent. Handles resolve to the
/// exact instance they were taken from and fail once that instance has been
/// dropped or replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRef<'a> {
    Name(&'a str),
    Handle(TableHandle),
}

impl TableRef<'_> {
    /// Name as written by the caller, before resolution.
    pub fn name(&self) -> &str {
        match self {
            TableRef::Name(name) => name,
            TableRef::Handle(handle) => handle.name(),
        }
    }
}

impl fmt::Display for TableRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRef::Name(name) => write!(f, "{name}"),
            TableRef::Handle(handle) => write!(f, "{}#{}", handle.name, handle.id),
        }
    }
}

impl<'a> From<&'a str> for TableRef<'a> {
    fn from(value: &'a str) -> Self {
        TableRef::Name(value)
    }
}

impl<'a> From<&'a String> for TableRef<'a> {
    fn from(value: &'a String) -> Self {
        TableRef::Name(value.as_str())
    }
}

impl From<TableHandle> for TableRef<'_> {
    fn from(value: TableHandle) -> Self {
        TableRef::Handle(value)
    }
}

impl From<&TableHandle> for TableRef<'_> {
    fn from(value: &TableHandle) -> Self {
        TableRef::Handle(value.clone())
    }
}

/// Table capabilities required by the reconciler.
pub trait TableModel {
    fn name(&self) -> &str;

    fn handle(&self) -> TableHandle;

    fn has_foreign_key(&self, name: &str) -> bool;

    fn remove_foreign_key(&mut self, name: &str) -> Result<ForeignKey>;

    fn add_foreign_key(
        &mut self,
        name: &str,
        columns: Vec<String>,
        foreign_table: &str,
        foreign_columns: Vec<String>,
        options: ForeignKeyOptions,
    ) -> Result<&ForeignKey>;

    /// Declared primary key columns in order; fails when there is none.
    fn primary_key_columns(&self) -> Result<Vec<String>>;
}

/// Schema capabilities required by the reconciler.
pub trait SchemaModel {
    type Table: TableModel;

    fn has_table(&self, name: &str) -> bool;

    fn table(&self, name: &str) -> Result<&Self::Table>;

    fn table_mut(&mut self, name: &str) -> Result<&mut Self::Table>;

    /// Insert a new empty table.
    fn create_table(&mut self, name: &str) -> Result<&mut Self::Table>;

    /// Remove a table; fails when it does not exist.
    fn drop_table(&mut self, name: &str) -> Result<Self::Table>;

    /// Resolve a name-or-handle reference to a table in this schema.
    fn resolve(&self, table: &TableRef<'_>) -> Result<&Self::Table> {
        match table {
            TableRef::Name(name) => self.table(name),
            TableRef::Handle(handle) => {
                let stale = || Error::StaleTable {
                    name: handle.name().to_string(),
                    id: handle.id(),
                };
                let found = self.table(handle.name()).map_err(|_| stale())?;
                if found.handle().id() == handle.id() {
                    Ok(found)
                } else {
                    Err(stale())
                }
            }
        }
    }
}

impl TableModel for Table {
    fn name(&self) -> &str {
        Table::name(self)
    }

    fn handle(&self) -> TableHandle {
        Table::handle(self)
    }

    fn has_foreign_key(&self, name: &str) -> bool {
        Table::has_foreign_key(self, name)
    }

    fn remove_foreign_key(&mut self, name: &str) -> Result<ForeignKey> {
        Table::remove_foreign_key(self, name)
    }

    fn add_foreign_key(
        &mut self,
        name: &str,
        columns: Vec<String>,
        foreign_table: &str,
        foreign_columns: Vec<String>,
        options: ForeignKeyOptions,
    ) -> Result<&ForeignKey> {
        Table::add_foreign_key(self, name, columns, foreign_table, foreign_columns, options)
    }

    fn primary_key_columns(&self) -> Result<Vec<String>> {
        Table::primary_key_columns(self)
    }
}

impl SchemaModel for Schema {
    type Table = Table;

    fn has_table(&self, name: &str) -> bool {
        Schema::has_table(self, name)
    }

    fn table(&self, name: &str) -> Result<&Table> {
        Schema::table(self, name)
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        Schema::table_mut(self, name)
    }

    fn create_table(&mut self, name: &str) -> Result<&mut Table> {
        Schema::create_table(self, name)
    }

    fn drop_table(&mut self, name: &str) -> Result<Table> {
        Schema::drop_table(self, name)
    }
}
