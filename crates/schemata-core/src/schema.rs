use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{ForeignKey, ForeignKeyOptions, Index, PrimaryKey};
use crate::error::{Error, Result};
use crate::model::TableHandle;
use crate::types::ColumnType;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one table instance.
///
/// Every table created (or deserialized) gets a fresh id, so a table that was
/// dropped and recreated under the same name is distinguishable from the old
/// one. Clones share the id of their source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct TableId(u64);

impl TableId {
    pub fn fresh() -> Self {
        Self(NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Top-level schema model: an ordered collection of uniquely named tables.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "SchemaRecord")]
pub struct Schema {
    /// Contract version for this schema format.
    schema_version: String,
    #[serde(default)]
    tables: Vec<Table>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    pub fn new() -> Self {
        Self {
            schema_version: crate::SCHEMA_VERSION.to_string(),
            tables: Vec::new(),
        }
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|table| table.name == name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|table| table.name == name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Insert a new empty table and return it for population.
    pub fn create_table(&mut self, name: &str) -> Result<&mut Table> {
        if self.has_table(name) {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }
        self.tables.push(Table::new(name));
        let idx = self.tables.len() - 1;
        Ok(&mut self.tables[idx])
    }

    /// Remove a table, returning it.
    ///
    /// Foreign keys held by other tables that point at the removed table are
    /// left in place.
    pub fn drop_table(&mut self, name: &str) -> Result<Table> {
        let idx = self
            .position(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        Ok(self.tables.remove(idx))
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|table| table.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|table| table.name == name)
    }
}

/// Snapshot form of [`Schema`], checked before it becomes one.
#[derive(Deserialize)]
struct SchemaRecord {
    schema_version: String,
    #[serde(default)]
    tables: Vec<Table>,
}

impl TryFrom<SchemaRecord> for Schema {
    type Error = Error;

    fn try_from(record: SchemaRecord) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for table in &record.tables {
            if !seen.insert(table.name.as_str()) {
                return Err(Error::TableAlreadyExists(table.name.clone()));
            }
        }
        Ok(Self {
            schema_version: record.schema_version,
            tables: record.tables,
        })
    }
}

/// A table definition: columns, primary key, indexes and named foreign keys.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "TableRecord")]
pub struct Table {
    #[serde(skip, default = "TableId::fresh")]
    id: TableId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    primary_key: Option<PrimaryKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    indexes: Vec<Index>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    foreign_keys: BTreeMap<String, ForeignKey>,
}

/// Snapshot form of [`Table`]. Foreign keys are re-keyed by their own name.
#[derive(Deserialize)]
struct TableRecord {
    name: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default)]
    primary_key: Option<PrimaryKey>,
    #[serde(default)]
    indexes: Vec<Index>,
    #[serde(default)]
    foreign_keys: BTreeMap<String, ForeignKey>,
}

impl TryFrom<TableRecord> for Table {
    type Error = Error;

    fn try_from(record: TableRecord) -> Result<Self> {
        let mut foreign_keys = BTreeMap::new();
        for fk in record.foreign_keys.into_values() {
            if fk.local_table != record.name {
                return Err(Error::InvalidForeignKey {
                    name: fk.name,
                    reason: format!(
                        "held by {} but declared on {}",
                        record.name, fk.local_table
                    ),
                });
            }
            if foreign_keys.contains_key(&fk.name) {
                return Err(Error::DuplicateForeignKey {
                    table: record.name,
                    name: fk.name,
                });
            }
            foreign_keys.insert(fk.name.clone(), fk);
        }

        Ok(Self {
            id: TableId::fresh(),
            name: record.name,
            comment: record.comment,
            columns: record.columns,
            primary_key: record.primary_key,
            indexes: record.indexes,
            foreign_keys,
        })
    }
}

impl Table {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            id: TableId::fresh(),
            name: name.to_string(),
            comment: None,
            columns: Vec::new(),
            primary_key: None,
            indexes: Vec::new(),
            foreign_keys: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token identifying this exact table instance.
    pub fn handle(&self) -> TableHandle {
        TableHandle::new(self.id, &self.name)
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Append a column, returning it so callers can refine it in place.
    pub fn add_column(
        &mut self,
        name: &str,
        column_type: impl Into<ColumnType>,
    ) -> Result<&mut Column> {
        if self.has_column(name) {
            return Err(Error::DuplicateColumn {
                table: self.name.clone(),
                column: name.to_string(),
            });
        }
        self.columns.push(Column::new(name, column_type.into()));
        let idx = self.columns.len() - 1;
        Ok(&mut self.columns[idx])
    }

    /// Declare the primary key. Key columns become non-nullable.
    pub fn set_primary_key<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<&mut Self> {
        if columns.is_empty() {
            return Err(Error::InvalidSchema(format!(
                "primary key of {} has no columns",
                self.name
            )));
        }
        let columns = self.existing_columns(columns)?;
        for name in &columns {
            if let Some(column) = self.column_mut(name) {
                column.is_nullable = false;
            }
        }
        self.primary_key = Some(PrimaryKey {
            name: None,
            columns,
        });
        Ok(self)
    }

    pub fn primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key.as_ref()
    }

    /// Primary key column names in declaration order.
    pub fn primary_key_columns(&self) -> Result<Vec<String>> {
        self.primary_key
            .as_ref()
            .map(|pk| pk.columns.clone())
            .ok_or_else(|| Error::NoPrimaryKey(self.name.clone()))
    }

    pub fn add_index<S: AsRef<str>>(
        &mut self,
        name: &str,
        columns: &[S],
        is_unique: bool,
    ) -> Result<&mut Self> {
        if self.indexes.iter().any(|index| index.name == name) {
            return Err(Error::InvalidSchema(format!(
                "duplicate index name: {}.{}",
                self.name, name
            )));
        }
        let columns = self.existing_columns(columns)?;
        self.indexes.push(Index {
            name: name.to_string(),
            columns,
            is_unique,
        });
        Ok(self)
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn has_foreign_key(&self, name: &str) -> bool {
        self.foreign_keys.contains_key(name)
    }

    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.get(name)
    }

    /// Foreign keys ordered by name.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.foreign_keys.values()
    }

    pub(crate) fn foreign_key_entries(&self) -> impl Iterator<Item = (&str, &ForeignKey)> {
        self.foreign_keys
            .iter()
            .map(|(name, fk)| (name.as_str(), fk))
    }

    pub fn remove_foreign_key(&mut self, name: &str) -> Result<ForeignKey> {
        self.foreign_keys
            .remove(name)
            .ok_or_else(|| Error::ForeignKeyNotFound {
                table: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// Add a named foreign key from `columns` on this table to
    /// `foreign_columns` on `foreign_table`.
    ///
    /// Local columns must exist here. Foreign columns are only checked for
    /// arity; whether they exist is up to [`crate::validate_schema`].
    pub fn add_foreign_key(
        &mut self,
        name: &str,
        columns: Vec<String>,
        foreign_table: &str,
        foreign_columns: Vec<String>,
        options: ForeignKeyOptions,
    ) -> Result<&ForeignKey> {
        if self.has_foreign_key(name) {
            return Err(Error::DuplicateForeignKey {
                table: self.name.clone(),
                name: name.to_string(),
            });
        }
        self.check_foreign_key_columns(name, &columns, &foreign_columns)?;

        let fk = ForeignKey {
            name: name.to_string(),
            local_table: self.name.clone(),
            columns,
            foreign_table: foreign_table.to_string(),
            foreign_columns,
            options,
        };
        Ok(self.foreign_keys.entry(name.to_string()).or_insert(fk))
    }

    /// Check a key mapping against this table without touching its keys:
    /// at least one local column, every local column present, and as many
    /// foreign columns as local ones.
    pub fn check_foreign_key_columns(
        &self,
        name: &str,
        columns: &[String],
        foreign_columns: &[String],
    ) -> Result<()> {
        if columns.is_empty() {
            return Err(Error::InvalidForeignKey {
                name: name.to_string(),
                reason: "no local columns".to_string(),
            });
        }
        if columns.len() != foreign_columns.len() {
            return Err(Error::InvalidForeignKey {
                name: name.to_string(),
                reason: format!(
                    "{} local columns but {} foreign columns",
                    columns.len(),
                    foreign_columns.len()
                ),
            });
        }
        self.existing_columns(columns)?;
        Ok(())
    }

    fn existing_columns<S: AsRef<str>>(&self, columns: &[S]) -> Result<Vec<String>> {
        columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                if self.has_column(column) {
                    Ok(column.to_string())
                } else {
                    Err(Error::ColumnNotFound {
                        table: self.name.clone(),
                        column: column.to_string(),
                    })
                }
            })
            .collect()
    }
}

/// Column metadata for a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    name: String,
    pub column_type: ColumnType,
    #[serde(default = "default_nullable")]
    pub is_nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl Column {
    fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            is_nullable: true,
            default: None,
            comment: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn not_null(&mut self) -> &mut Self {
        self.is_nullable = false;
        self
    }

    pub fn default_value(&mut self, expression: impl Into<String>) -> &mut Self {
        self.default = Some(expression.into());
        self
    }

    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }
}
