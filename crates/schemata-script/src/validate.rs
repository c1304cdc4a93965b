use std::collections::HashSet;

use jsonschema::JSONSchema;
use serde_json::Value;

use crate::errors::{ScriptError, ValidationIssue, ValidationReport};
use crate::model::{ForeignKeySpec, SCRIPT_VERSION, Script, Step, TableSpec};

/// Validate a script JSON document against the script JSON Schema.
pub fn validate_script_json(
    script_json: &Value,
    script_schema: &Value,
) -> Result<ValidationReport, ScriptError> {
    let compiled =
        JSONSchema::compile(script_schema).map_err(|err| ScriptError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(script_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
            ));
        }
    }

    Ok(report)
}

/// Check a parsed script for mistakes the JSON Schema cannot express.
///
/// Tables are tracked through the steps so that keys declared against a
/// table dropped earlier in the same script are caught before anything is
/// applied.
pub fn validate_script(script: &Script) -> ValidationReport {
    let mut report = ValidationReport::default();

    if script.script_version != SCRIPT_VERSION {
        report.push(
            ValidationIssue::error(
                "script_version_mismatch",
                "/script_version",
                format!(
                    "script_version '{}' is not supported (expected '{}')",
                    script.script_version, SCRIPT_VERSION
                ),
            )
            .with_hint(format!("set script_version to '{SCRIPT_VERSION}'")),
        );
    }

    let mut declared: HashSet<&str> = HashSet::new();
    let mut dropped: HashSet<&str> = HashSet::new();

    for (index, step) in script.steps.iter().enumerate() {
        let path = format!("/steps/{index}");
        match step {
            Step::CreateTable(spec) => {
                if declared.contains(spec.name.as_str()) {
                    report.push(ValidationIssue::warning(
                        "redundant_create",
                        &path,
                        format!(
                            "table '{}' is already declared by an earlier step; this create is a no-op",
                            spec.name
                        ),
                    ));
                }
                validate_table_spec(spec, &path, &mut report);
                declared.insert(&spec.name);
                dropped.remove(spec.name.as_str());
            }
            Step::DefineTable(spec) => {
                validate_table_spec(spec, &path, &mut report);
                declared.insert(&spec.name);
                dropped.remove(spec.name.as_str());
            }
            Step::DropTable(step) => {
                declared.remove(step.name.as_str());
                dropped.insert(&step.name);
            }
            Step::DefineForeignKey(spec) => {
                validate_foreign_key_spec(spec, &path, &mut report);
                let references = [("table", &spec.table), ("foreign_table", &spec.foreign_table)];
                for (field, table) in references {
                    if dropped.contains(table.as_str()) {
                        report.push(ValidationIssue::error(
                            "dropped_table_reference",
                            format!("{path}/{field}"),
                            format!("table '{table}' is dropped by an earlier step"),
                        ));
                    }
                }
            }
            Step::DropForeignKey(step) => {
                if dropped.contains(step.table.as_str()) {
                    report.push(ValidationIssue::error(
                        "dropped_table_reference",
                        format!("{path}/table"),
                        format!("table '{}' is dropped by an earlier step", step.table),
                    ));
                }
            }
        }
    }

    report
}

/// Validate a script document end-to-end, returning the parsed script.
pub fn validate_script_document(
    script_json: &Value,
    script_schema: &Value,
) -> Result<(Script, ValidationReport), ValidationReport> {
    let structural = match validate_script_json(script_json, script_schema) {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "schema_validation_error",
                "/",
                err.to_string(),
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let script: Script = match serde_json::from_value(script_json.clone()) {
        Ok(script) => script,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "invalid_script_json",
                "/",
                err.to_string(),
            ));
            return Err(report);
        }
    };

    let report = validate_script(&script);
    if !report.is_ok() {
        return Err(report);
    }

    Ok((script, report))
}

fn validate_table_spec(spec: &TableSpec, path: &str, report: &mut ValidationReport) {
    if spec.name.trim().is_empty() {
        report.push(ValidationIssue::error(
            "empty_name",
            format!("{path}/name"),
            "table name must not be empty",
        ));
    }

    if spec.columns.is_empty() {
        report.push(ValidationIssue::warning(
            "empty_table",
            format!("{path}/columns"),
            format!("table '{}' declares no columns", spec.name),
        ));
    }

    let mut columns = HashSet::new();
    for (index, column) in spec.columns.iter().enumerate() {
        if !columns.insert(column.name.as_str()) {
            report.push(ValidationIssue::error(
                "duplicate_column",
                format!("{path}/columns/{index}/name"),
                format!("column '{}.{}' is declared twice", spec.name, column.name),
            ));
        }
    }

    for (index, column) in spec.primary_key.iter().enumerate() {
        if !columns.contains(column.as_str()) {
            report.push(ValidationIssue::error(
                "unknown_column",
                format!("{path}/primary_key/{index}"),
                format!("primary key column '{}.{}' is not declared", spec.name, column),
            ));
        }
    }

    for (idx, index) in spec.indexes.iter().enumerate() {
        for (col_idx, column) in index.columns.iter().enumerate() {
            if !columns.contains(column.as_str()) {
                report.push(ValidationIssue::error(
                    "unknown_column",
                    format!("{path}/indexes/{idx}/columns/{col_idx}"),
                    format!(
                        "index '{}' column '{}.{}' is not declared",
                        index.name, spec.name, column
                    ),
                ));
            }
        }
    }
}

fn validate_foreign_key_spec(spec: &ForeignKeySpec, path: &str, report: &mut ValidationReport) {
    if spec.columns.is_empty() {
        report.push(ValidationIssue::error(
            "empty_foreign_key",
            format!("{path}/columns"),
            format!("foreign key '{}' has no local columns", spec.name),
        ));
    }

    if let Some(foreign_columns) = &spec.foreign_columns {
        if foreign_columns.len() != spec.columns.len() {
            report.push(
                ValidationIssue::error(
                    "column_count_mismatch",
                    format!("{path}/foreign_columns"),
                    format!(
                        "foreign key '{}' maps {} local columns onto {} foreign columns",
                        spec.name,
                        spec.columns.len(),
                        foreign_columns.len()
                    ),
                )
                .with_hint("omit foreign_columns to reference the primary key"),
            );
        }
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
