use schemata_core::{ForeignKeyOptions, Result, SchemaModel, TableModel, TableRef};
use tracing::debug;

/// Applies idempotent desired-state operations to a schema model.
///
/// Every operation returns the reconciler again so a reconciliation script
/// reads as a chain of `?`-separated steps. The reconciler keeps no state of
/// its own beyond the exclusive borrow of the schema.
pub struct Reconciler<'a, S: SchemaModel> {
    schema: &'a mut S,
}

impl<'a, S: SchemaModel> Reconciler<'a, S> {
    pub fn new(schema: &'a mut S) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &S {
        &*self.schema
    }

    pub fn schema_mut(&mut self) -> &mut S {
        &mut *self.schema
    }

    pub fn into_inner(self) -> &'a mut S {
        self.schema
    }

    /// Create `name` and populate it with `define`, unless it already exists.
    ///
    /// An existing table is left exactly as it is and `define` is not called.
    pub fn create_table<F>(&mut self, name: &str, define: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut S::Table) -> Result<()>,
    {
        if self.schema.has_table(name) {
            debug!(event = "table_exists", table = name);
            return Ok(self);
        }

        let table = self.schema.create_table(name)?;
        debug!(event = "table_created", table = name);
        define(table)?;
        Ok(self)
    }

    /// Replace `name` with a fresh table populated by `define`.
    ///
    /// Whatever was there before is discarded, including the table's own
    /// foreign keys. Keys on other tables that reference it are not touched.
    pub fn define_table<F>(&mut self, name: &str, define: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut S::Table) -> Result<()>,
    {
        self.drop_table(name)?;

        let table = self.schema.create_table(name)?;
        debug!(event = "table_defined", table = name);
        define(table)?;
        Ok(self)
    }

    /// Remove `name` if present; a missing table is not an error.
    pub fn drop_table(&mut self, name: &str) -> Result<&mut Self> {
        if !self.schema.has_table(name) {
            debug!(event = "table_absent", table = name);
            return Ok(self);
        }

        self.schema.drop_table(name)?;
        debug!(event = "table_dropped", table = name);
        Ok(self)
    }

    /// Ensure `local_table` carries exactly one foreign key called `name`
    /// with the given mapping.
    ///
    /// Tables given by name must exist. When `foreign_columns` is `None` the
    /// foreign table's primary key columns are used, in declaration order.
    /// An existing key with the same name is replaced; if the new mapping is
    /// rejected the existing key stays as it was.
    pub fn define_named_foreign_key<'t>(
        &mut self,
        name: &str,
        local_table: impl Into<TableRef<'t>>,
        local_columns: &[&str],
        foreign_table: impl Into<TableRef<'t>>,
        foreign_columns: Option<&[&str]>,
        options: Option<ForeignKeyOptions>,
    ) -> Result<&mut Self> {
        let local_table = local_table.into();
        let foreign_table = foreign_table.into();

        let local_name = self.schema.resolve(&local_table)?.name().to_string();
        let foreign = self.schema.resolve(&foreign_table)?;
        let foreign_name = foreign.name().to_string();
        let foreign_columns = match foreign_columns {
            Some(columns) => to_names(columns),
            None => foreign.primary_key_columns()?,
        };
        let local_columns = to_names(local_columns);

        let table = self.schema.table_mut(&local_name)?;
        table.check_foreign_key_columns(name, &local_columns, &foreign_columns)?;
        let replaced = table.has_foreign_key(name);
        if replaced {
            table.remove_foreign_key(name)?;
        }
        table.add_foreign_key(
            name,
            local_columns,
            &foreign_name,
            foreign_columns,
            options.unwrap_or_default(),
        )?;

        let event = if replaced {
            "foreign_key_replaced"
        } else {
            "foreign_key_defined"
        };
        debug!(
            event,
            table = %local_name,
            foreign_key = name,
            foreign_table = %foreign_name,
        );
        Ok(self)
    }

    /// Remove the foreign key `name` from `table` if present.
    ///
    /// The table itself must exist; only the key's absence is absorbed.
    pub fn drop_named_foreign_key<'t>(
        &mut self,
        table: impl Into<TableRef<'t>>,
        name: &str,
    ) -> Result<&mut Self> {
        let table = table.into();
        let table_name = self.schema.resolve(&table)?.name().to_string();

        let table = self.schema.table_mut(&table_name)?;
        if table.has_foreign_key(name) {
            table.remove_foreign_key(name)?;
            debug!(event = "foreign_key_dropped", table = %table_name, foreign_key = name);
        } else {
            debug!(event = "foreign_key_absent", table = %table_name, foreign_key = name);
        }
        Ok(self)
    }
}

fn to_names(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|column| column.to_string()).collect()
}
