use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::schema::Schema;

/// Validate internal consistency of a schema.
///
/// This checks:
/// - duplicate tables/columns (possible in deserialized snapshots)
/// - primary key and index columns exist
/// - foreign key columns and referenced targets exist
/// - foreign key column lists have matching lengths
/// - each foreign key is filed under its own name and table
///
/// Dropping or redefining a table never cascades to keys held by other
/// tables; this is where such dangling references surface.
pub fn validate_schema(schema: &Schema) -> Result<()> {
    let mut catalog: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for table in schema.tables() {
        if catalog.contains_key(table.name()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}",
                table.name()
            )));
        }

        let mut columns = BTreeSet::new();
        for column in table.columns() {
            if !columns.insert(column.name()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {}.{}",
                    table.name(),
                    column.name()
                )));
            }
        }

        catalog.insert(table.name(), columns);
    }

    for table in schema.tables() {
        let columns = &catalog[table.name()];

        if let Some(pk) = table.primary_key() {
            for column in &pk.columns {
                if !columns.contains(column.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "primary key column not found: {}.{}",
                        table.name(),
                        column
                    )));
                }
            }
        }

        for index in table.indexes() {
            for column in &index.columns {
                if !columns.contains(column.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "index column not found: {}.{} ({})",
                        table.name(),
                        column,
                        index.name
                    )));
                }
            }
        }

        for (key, fk) in table.foreign_key_entries() {
            if key != fk.name {
                return Err(Error::InvalidSchema(format!(
                    "foreign key {}.{} is stored under {}",
                    table.name(),
                    fk.name,
                    key
                )));
            }

            if fk.local_table != table.name() {
                return Err(Error::InvalidSchema(format!(
                    "foreign key {}.{} claims local table {}",
                    table.name(),
                    fk.name,
                    fk.local_table
                )));
            }

            for column in &fk.columns {
                if !columns.contains(column.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "foreign key column not found: {}.{} ({})",
                        table.name(),
                        column,
                        fk.name
                    )));
                }
            }

            if fk.columns.len() != fk.foreign_columns.len() {
                return Err(Error::InvalidSchema(format!(
                    "foreign key {}.{} maps {} columns onto {}",
                    table.name(),
                    fk.name,
                    fk.columns.len(),
                    fk.foreign_columns.len()
                )));
            }

            let ref_columns = catalog.get(fk.foreign_table.as_str()).ok_or_else(|| {
                Error::InvalidSchema(format!(
                    "referenced table not found: {} ({}.{})",
                    fk.foreign_table,
                    table.name(),
                    fk.name
                ))
            })?;

            for column in &fk.foreign_columns {
                if !ref_columns.contains(column.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "referenced column not found: {}.{} ({}.{})",
                        fk.foreign_table,
                        column,
                        table.name(),
                        fk.name
                    )));
                }
            }
        }
    }

    Ok(())
}
