use schemars::schema_for;
use schemata_core::{ColumnType, FkAction, ForeignKeyOptions, Schema, validate_schema};

#[test]
fn serializes_schema_deterministically() {
    let mut schema = Schema::new();
    let users = schema.create_table("users").expect("users");
    users.add_column("id", ColumnType::integer()).expect("id");
    users.set_primary_key(&["id"]).expect("pk");

    let json = serde_json::to_string_pretty(&schema).expect("serialize schema");
    let expected = r#"{
  "schema_version": "0.1",
  "tables": [
    {
      "name": "users",
      "columns": [
        {
          "name": "id",
          "column_type": {
            "data_type": "integer"
          },
          "is_nullable": false
        }
      ],
      "primary_key": {
        "name": null,
        "columns": [
          "id"
        ]
      }
    }
  ]
}"#;
    assert_eq!(json, expected);
}

#[test]
fn deserialized_snapshot_defaults_foreign_key_options() {
    let json = serde_json::json!({
        "schema_version": "0.1",
        "tables": [
            {
                "name": "users",
                "columns": [{ "name": "id", "column_type": { "data_type": "integer" } }],
                "primary_key": { "name": null, "columns": ["id"] }
            },
            {
                "name": "posts",
                "columns": [
                    { "name": "id", "column_type": { "data_type": "integer" } },
                    { "name": "author_id", "column_type": { "data_type": "integer" } }
                ],
                "foreign_keys": {
                    "fk_posts_author": {
                        "name": "fk_posts_author",
                        "local_table": "posts",
                        "columns": ["author_id"],
                        "foreign_table": "users",
                        "foreign_columns": ["id"]
                    }
                }
            }
        ]
    });

    let schema: Schema = serde_json::from_value(json).expect("parse schema");
    validate_schema(&schema).expect("valid snapshot");

    let posts = schema.table("posts").expect("posts");
    let fk = posts.foreign_key("fk_posts_author").expect("fk");
    assert_eq!(fk.options, ForeignKeyOptions::default());
    assert_eq!(fk.options.on_delete, FkAction::NoAction);
    assert!(posts.column("author_id").expect("column").is_nullable);
    assert_ne!(schema.table("users").expect("users").id(), posts.id());
}

#[test]
fn json_schema_describes_tables_and_foreign_keys() {
    let generated = schema_for!(Schema);
    let json = serde_json::to_string(&generated).expect("serialize generated schema");
    assert!(json.contains("\"tables\""));
    assert!(json.contains("\"foreign_keys\""));
    assert!(json.contains("\"ForeignKeyOptions\""));
}

fn keyed_snapshot(key: &str, local_table: &str) -> serde_json::Value {
    serde_json::json!({
        "schema_version": "0.1",
        "tables": [
            {
                "name": "bar",
                "columns": [{ "name": "id", "column_type": { "data_type": "integer" } }],
                "primary_key": { "name": null, "columns": ["id"] }
            },
            {
                "name": "foo",
                "columns": [{ "name": "bar_id", "column_type": { "data_type": "integer" } }],
                "foreign_keys": {
                    key: {
                        "name": "FK_Foo_bar",
                        "local_table": local_table,
                        "columns": ["bar_id"],
                        "foreign_table": "bar",
                        "foreign_columns": ["id"]
                    }
                }
            }
        ]
    })
}

#[test]
fn snapshot_foreign_keys_are_filed_under_their_own_name() {
    let schema: Schema =
        serde_json::from_value(keyed_snapshot("stale_key", "foo")).expect("parse schema");
    let foo = schema.table("foo").expect("foo");
    assert!(foo.has_foreign_key("FK_Foo_bar"));
    assert!(!foo.has_foreign_key("stale_key"));
    assert_eq!(foo.foreign_keys().count(), 1);
    validate_schema(&schema).expect("valid snapshot");

    let json = serde_json::to_value(&schema).expect("serialize schema");
    assert!(json["tables"][1]["foreign_keys"]["FK_Foo_bar"].is_object());
}

#[test]
fn snapshot_rejects_foreign_key_held_by_another_table() {
    let err = serde_json::from_value::<Schema>(keyed_snapshot("FK_Foo_bar", "bar")).unwrap_err();
    assert!(err.to_string().contains("FK_Foo_bar"), "{err}");
}

#[test]
fn snapshot_rejects_foreign_key_name_used_twice() {
    let mut json = keyed_snapshot("FK_Foo_bar", "foo");
    let fk = json["tables"][1]["foreign_keys"]["FK_Foo_bar"].clone();
    json["tables"][1]["foreign_keys"]["other_key"] = fk;

    let err = serde_json::from_value::<Schema>(json).unwrap_err();
    assert!(err.to_string().contains("duplicate foreign key"), "{err}");
}

#[test]
fn snapshot_rejects_duplicate_table_names() {
    let mut json = keyed_snapshot("FK_Foo_bar", "foo");
    let bar = json["tables"][0].clone();
    json["tables"].as_array_mut().expect("tables").push(bar);

    let err = serde_json::from_value::<Schema>(json).unwrap_err();
    assert!(err.to_string().contains("bar"), "{err}");
}
