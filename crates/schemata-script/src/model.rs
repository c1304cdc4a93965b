use schemars::JsonSchema;
use schemata_core::{ColumnType, ForeignKeyOptions};
use serde::{Deserialize, Serialize};

/// Current contract version for `*.script.json` documents.
pub const SCRIPT_VERSION: &str = "0.1";

/// Ordered list of reconciliation steps.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    /// Contract version for the script format.
    pub script_version: String,
    /// Steps applied in order.
    pub steps: Vec<Step>,
}

/// One reconciliation step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Create the table unless it already exists.
    CreateTable(TableSpec),
    /// Replace the table entirely.
    DefineTable(TableSpec),
    /// Drop the table if it exists.
    DropTable(DropTableStep),
    /// Declare (or re-declare) a named foreign key.
    DefineForeignKey(ForeignKeySpec),
    /// Drop a named foreign key if it exists.
    DropForeignKey(DropForeignKeyStep),
}

impl Step {
    /// Short operation label used in logs and reports.
    pub fn op(&self) -> &'static str {
        match self {
            Step::CreateTable(_) => "create_table",
            Step::DefineTable(_) => "define_table",
            Step::DropTable(_) => "drop_table",
            Step::DefineForeignKey(_) => "define_foreign_key",
            Step::DropForeignKey(_) => "drop_foreign_key",
        }
    }

    /// Table the step acts on.
    pub fn table(&self) -> &str {
        match self {
            Step::CreateTable(spec) | Step::DefineTable(spec) => &spec.name,
            Step::DropTable(step) => &step.name,
            Step::DefineForeignKey(spec) => &spec.table,
            Step::DropForeignKey(step) => &step.table,
        }
    }
}

/// Declared structure of a table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub columns: Vec<ColumnSpec>,
    /// Primary key columns in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexSpec>,
}

/// Declared column.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnTypeSpec,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

fn default_nullable() -> bool {
    true
}

/// Column type; accepts a bare type name or a full definition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ColumnTypeSpec {
    Name(String),
    Full(ColumnType),
}

impl ColumnTypeSpec {
    pub fn to_column_type(&self) -> ColumnType {
        match self {
            ColumnTypeSpec::Name(name) => ColumnType::new(name.as_str()),
            ColumnTypeSpec::Full(column_type) => column_type.clone(),
        }
    }
}

/// Declared index.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IndexSpec {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

/// Drop-table step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DropTableStep {
    pub name: String,
}

/// Declared foreign key.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeySpec {
    pub name: String,
    /// Table that owns the key.
    pub table: String,
    pub columns: Vec<String>,
    pub foreign_table: String,
    /// Defaults to the foreign table's primary key when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ForeignKeyOptions>,
}

/// Drop-foreign-key step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DropForeignKeyStep {
    pub table: String,
    pub name: String,
}
