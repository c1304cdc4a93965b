use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Primary key definition preserving column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PrimaryKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// Index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
}

/// Foreign key action semantics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FkAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

/// Foreign key match semantics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FkMatchType {
    Full,
    Partial,
    #[default]
    Simple,
}

/// Option bag attached to a foreign key.
///
/// The default is the empty bag: no referential actions, simple matching,
/// not deferrable and no platform-specific extras.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyOptions {
    #[serde(default)]
    pub on_update: FkAction,
    #[serde(default)]
    pub on_delete: FkAction,
    #[serde(default)]
    pub match_type: FkMatchType,
    #[serde(default)]
    pub is_deferrable: bool,
    #[serde(default)]
    pub initially_deferred: bool,
    /// Free-form options passed through untouched (e.g. engine hints).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ForeignKeyOptions {
    pub fn on_delete(mut self, action: FkAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn on_update(mut self, action: FkAction) -> Self {
        self.on_update = action;
        self
    }

    pub fn deferrable(mut self, initially_deferred: bool) -> Self {
        self.is_deferrable = true;
        self.initially_deferred = initially_deferred;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Foreign key definition preserving column ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKey {
    pub name: String,
    pub local_table: String,
    pub columns: Vec<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,
    #[serde(default)]
    pub options: ForeignKeyOptions,
}

impl ForeignKey {
    /// Returns true when the key points back at its own table.
    pub fn is_self_referencing(&self) -> bool {
        self.local_table == self.foreign_table
    }
}
