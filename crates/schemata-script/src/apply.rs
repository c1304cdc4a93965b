use schemata_core::{Schema, Table, validate_schema};
use schemata_reconcile::Reconciler;
use tracing::{info, warn};

use crate::errors::{Result, ScriptError, ValidationIssue};
use crate::model::{Script, Step, TableSpec};
use crate::validate::validate_script;

/// Options that control how a script is applied.
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Run [`validate_script`] first and refuse scripts with errors.
    pub validate_script: bool,
    /// Run [`validate_schema`] once all steps are applied and report
    /// inconsistencies (e.g. keys left dangling by a redefinition) as warnings.
    pub validate_schema_after: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            validate_script: true,
            validate_schema_after: true,
        }
    }
}

/// Outcome of a successful script run.
#[derive(Debug, Clone, Default)]
pub struct ApplySummary {
    pub steps_applied: usize,
    pub tables: usize,
    pub warnings: Vec<ValidationIssue>,
}

/// Apply every step of `script` to `schema`, in order.
///
/// A failing step aborts the run; steps before it stay applied.
pub fn apply_script(
    schema: &mut Schema,
    script: &Script,
    options: &ApplyOptions,
) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();

    if options.validate_script {
        let report = validate_script(script);
        if !report.is_ok() {
            return Err(ScriptError::Invalid(report));
        }
        summary.warnings.extend(report.warnings);
    }

    info!(event = "script_started", steps = script.steps.len());

    let mut reconciler = Reconciler::new(schema);
    for (index, step) in script.steps.iter().enumerate() {
        apply_step(&mut reconciler, step).map_err(|source| ScriptError::Step {
            index,
            op: step.op(),
            source,
        })?;
        summary.steps_applied += 1;
    }

    let schema = reconciler.into_inner();
    summary.tables = schema.len();

    if options.validate_schema_after {
        if let Err(err) = validate_schema(schema) {
            warn!(event = "schema_inconsistent", error = %err);
            summary.warnings.push(
                ValidationIssue::warning("schema_inconsistent", "/", err.to_string())
                    .with_hint("re-declare foreign keys that reference redefined tables"),
            );
        }
    }

    info!(
        event = "script_finished",
        steps = summary.steps_applied,
        tables = summary.tables,
        warnings = summary.warnings.len()
    );
    Ok(summary)
}

fn apply_step(reconciler: &mut Reconciler<'_, Schema>, step: &Step) -> schemata_core::Result<()> {
    match step {
        Step::CreateTable(spec) => {
            reconciler.create_table(&spec.name, |table| populate(table, spec))?;
        }
        Step::DefineTable(spec) => {
            reconciler.define_table(&spec.name, |table| populate(table, spec))?;
        }
        Step::DropTable(drop) => {
            reconciler.drop_table(&drop.name)?;
        }
        Step::DefineForeignKey(spec) => {
            let columns: Vec<&str> = spec.columns.iter().map(String::as_str).collect();
            let foreign_columns: Option<Vec<&str>> = spec
                .foreign_columns
                .as_ref()
                .map(|columns| columns.iter().map(String::as_str).collect());
            reconciler.define_named_foreign_key(
                &spec.name,
                &spec.table,
                &columns,
                &spec.foreign_table,
                foreign_columns.as_deref(),
                spec.options.clone(),
            )?;
        }
        Step::DropForeignKey(drop) => {
            reconciler.drop_named_foreign_key(&drop.table, &drop.name)?;
        }
    }
    Ok(())
}

fn populate(table: &mut Table, spec: &TableSpec) -> schemata_core::Result<()> {
    if let Some(comment) = &spec.comment {
        table.set_comment(comment.as_str());
    }

    for column_spec in &spec.columns {
        let column_type = column_spec.column_type.to_column_type();
        let column = table.add_column(&column_spec.name, column_type)?;
        column.is_nullable = column_spec.nullable;
        if let Some(default) = &column_spec.default {
            column.default_value(default.as_str());
        }
        if let Some(comment) = &column_spec.comment {
            column.comment(comment.as_str());
        }
    }

    if !spec.primary_key.is_empty() {
        table.set_primary_key(spec.primary_key.as_slice())?;
    }

    for index in &spec.indexes {
        table.add_index(&index.name, index.columns.as_slice(), index.unique)?;
    }

    Ok(())
}
