use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Declared type of a column.
///
/// Kept opaque on purpose: the name is whatever the DDL emitter downstream
/// understands (`integer`, `varchar`, `timestamptz`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnType {
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_scale: Option<u32>,
}

impl ColumnType {
    pub fn new(data_type: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            character_max_length: None,
            numeric_precision: None,
            numeric_scale: None,
        }
    }

    pub fn integer() -> Self {
        Self::new("integer")
    }

    pub fn text() -> Self {
        Self::new("text")
    }

    pub fn varchar(length: u32) -> Self {
        Self {
            character_max_length: Some(length),
            ..Self::new("varchar")
        }
    }

    pub fn decimal(precision: u32, scale: u32) -> Self {
        Self {
            numeric_precision: Some(precision),
            numeric_scale: Some(scale),
            ..Self::new("decimal")
        }
    }
}

impl From<&str> for ColumnType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
