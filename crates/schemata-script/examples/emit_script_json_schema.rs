use schemata_script::script_json_schema;

fn main() {
    let schema = script_json_schema();
    let json = serde_json::to_string_pretty(&schema).expect("serialize script json schema");
    println!("{json}");
}
