use std::fs;
use std::path::Path;

use schemata_core::{ColumnType, FkAction, Schema};
use schemata_script::{
    ApplyOptions, Script, ScriptError, apply_script, script_json_schema, validate_script_document,
    validate_script_json,
};
use serde_json::{Value, json};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("schemata_script=info,schemata_reconcile=debug")
        .with_test_writer()
        .try_init();
}

fn load_json(path: &Path) -> Value {
    let contents =
        fs::read_to_string(path).unwrap_or_else(|_| panic!("missing json at {}", path.display()));
    serde_json::from_str(&contents).expect("parse json")
}

fn shop_script_json() -> Value {
    load_json(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/shop.script.json"))
}

fn script_schema_json() -> Value {
    serde_json::to_value(script_json_schema()).expect("serialize script json schema")
}

#[test]
fn shop_script_validates_against_json_schema() {
    let structural = validate_script_json(&shop_script_json(), &script_schema_json())
        .expect("validate script json");
    assert!(structural.errors.is_empty(), "structural errors: {structural:?}");

    let (script, report) = validate_script_document(&shop_script_json(), &script_schema_json())
        .expect("script should validate");
    assert_eq!(script.steps.len(), 4);
    assert!(report.warnings.is_empty(), "unexpected warnings");
}

#[test]
fn unknown_op_is_a_structural_error() {
    let script = json!({
        "script_version": "0.1",
        "steps": [{ "op": "truncate_table", "name": "customer" }]
    });
    let report = validate_script_document(&script, &script_schema_json()).unwrap_err();
    assert!(!report.errors.is_empty());
    assert!(report.errors.iter().all(|issue| issue.code == "schema_violation"));
}

#[test]
fn applying_the_shop_script_builds_the_model() {
    init_tracing();
    let script: Script = serde_json::from_value(shop_script_json()).expect("parse script");
    let mut schema = Schema::new();

    let summary = apply_script(&mut schema, &script, &ApplyOptions::default()).expect("apply");
    assert_eq!(summary.steps_applied, 4);
    assert_eq!(summary.tables, 2);
    assert!(summary.warnings.is_empty(), "warnings: {:?}", summary.warnings);

    let customer = schema.table("customer").expect("customer");
    assert_eq!(
        customer.column("email").expect("email").column_type,
        ColumnType::varchar(255)
    );
    assert!(customer.indexes()[0].is_unique);

    let purchase = schema.table("purchase").expect("purchase");
    assert_eq!(purchase.comment(), Some("one row per checkout"));
    assert_eq!(
        purchase.column("placed_at").expect("placed_at").default.as_deref(),
        Some("now()")
    );
    let fk = purchase.foreign_key("FK_Purchase_customer").expect("fk");
    assert_eq!(fk.foreign_columns, vec!["id"]);
    assert_eq!(fk.options.on_delete, FkAction::Cascade);
}

#[test]
fn reapplying_keeps_created_tables_and_replaces_defined_ones() {
    init_tracing();
    let script: Script = serde_json::from_value(shop_script_json()).expect("parse script");
    let mut schema = Schema::new();
    apply_script(&mut schema, &script, &ApplyOptions::default()).expect("first apply");

    let customer_id = schema.table("customer").expect("customer").id();
    let purchase_id = schema.table("purchase").expect("purchase").id();

    apply_script(&mut schema, &script, &ApplyOptions::default()).expect("second apply");
    assert_eq!(schema.table("customer").expect("customer").id(), customer_id);
    assert_ne!(schema.table("purchase").expect("purchase").id(), purchase_id);
    assert_eq!(
        schema
            .table("purchase")
            .expect("purchase")
            .foreign_keys()
            .count(),
        1
    );
}

#[test]
fn failing_step_reports_its_index_and_keeps_earlier_steps() {
    let script: Script = serde_json::from_value(json!({
        "script_version": "0.1",
        "steps": [
            { "op": "create_table", "name": "audit", "columns": [{ "name": "ref", "type": "integer" }] },
            {
                "op": "define_foreign_key",
                "name": "FK_Audit_missing",
                "table": "audit",
                "columns": ["ref"],
                "foreign_table": "missing"
            }
        ]
    }))
    .expect("parse script");

    let mut schema = Schema::new();
    let err = apply_script(&mut schema, &script, &ApplyOptions::default()).unwrap_err();
    match err {
        ScriptError::Step { index, op, source } => {
            assert_eq!(index, 1);
            assert_eq!(op, "define_foreign_key");
            assert_eq!(source, schemata_core::Error::TableNotFound("missing".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(schema.has_table("audit"));
}

#[test]
fn dangling_keys_after_redefinition_become_warnings() {
    let mut schema = Schema::new();
    let script: Script = serde_json::from_value(shop_script_json()).expect("parse script");
    apply_script(&mut schema, &script, &ApplyOptions::default()).expect("apply");

    let redefine: Script = serde_json::from_value(json!({
        "script_version": "0.1",
        "steps": [{
            "op": "define_table",
            "name": "customer",
            "columns": [{ "name": "uuid", "type": "uuid" }],
            "primary_key": ["uuid"]
        }]
    }))
    .expect("parse script");

    let summary = apply_script(&mut schema, &redefine, &ApplyOptions::default()).expect("apply");
    assert_eq!(summary.warnings.len(), 1);
    assert_eq!(summary.warnings[0].code, "schema_inconsistent");

    let quiet = ApplyOptions {
        validate_schema_after: false,
        ..ApplyOptions::default()
    };
    let summary = apply_script(&mut schema, &redefine, &quiet).expect("apply");
    assert!(summary.warnings.is_empty());
}

#[test]
fn invalid_script_is_refused_before_any_step_runs() {
    let script: Script = serde_json::from_value(json!({
        "script_version": "0.1",
        "steps": [
            { "op": "create_table", "name": "a", "columns": [{ "name": "id", "type": "integer" }] },
            { "op": "create_table", "name": "b", "columns": [], "primary_key": ["id"] }
        ]
    }))
    .expect("parse script");

    let mut schema = Schema::new();
    let err = apply_script(&mut schema, &script, &ApplyOptions::default()).unwrap_err();
    assert!(matches!(err, ScriptError::Invalid(ref report) if report.errors.len() == 1));
    assert!(schema.is_empty());
}
