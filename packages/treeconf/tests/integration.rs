use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use treeconf::{
    ensure_source, filter_missing, json_to_value, prepare_destination, register_builtin_into,
    Config, Error, FieldSpec, Filter, Handler, HandlerRef, Override, Overrides, Registry,
    TreeType, Value, MISSING,
};

/// Stores raw bytes, whatever the extension.
#[derive(Default)]
struct DatHandler;

impl Handler for DatHandler {
    fn read(&self, path: &Path) -> treeconf::Result<Value> {
        ensure_source(path)?;
        Ok(Value::Bytes(fs::read(path)?))
    }

    fn write(&self, path: &Path, data: &Value, overwrite_ok: bool) -> treeconf::Result<()> {
        match data {
            Value::Bytes(bytes) => {
                prepare_destination(path, overwrite_ok)?;
                fs::write(path, bytes)?;
                Ok(())
            }
            other => Err(Error::invalid_data(format!("expected bytes, got {}", other.kind()))),
        }
    }
}

fn builtin() -> Registry {
    let mut registry = Registry::new();
    register_builtin_into(&mut registry);
    registry
}

fn keys(config: &Config) -> Vec<&str> {
    config.keys().collect()
}

#[test]
fn fixed_handler_with_empty_registry() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("x.dat"), b"\x00\x01payload").unwrap();

    let tree = TreeType::builder("Scenario")
        .field(
            "a",
            FieldSpec::new().path("x.dat").handler(Arc::new(DatHandler) as HandlerRef),
        )
        .build()
        .unwrap()
        .instantiate_with(&Registry::new(), Overrides::new())
        .unwrap();

    let config = tree.read(dir.path()).unwrap();
    assert_eq!(keys(&config), vec!["a"]);
    assert_eq!(
        config.get("a"),
        Some(&DatHandler.read(&dir.path().join("x.dat")).unwrap())
    );
}

#[test]
fn filtered_absent_file_reads_missing() {
    let dir = tempfile::tempdir().unwrap();

    let tree = TreeType::builder("Scenario")
        .field(
            "a",
            FieldSpec::new()
                .path("x.dat")
                .handler(filter_missing(Arc::new(DatHandler), true)),
        )
        .build()
        .unwrap()
        .instantiate_with(&Registry::new(), Overrides::new())
        .unwrap();

    let config = tree.read(dir.path()).unwrap();
    assert_eq!(config.get("a"), Some(&MISSING));

    // Without the filter the same read is an error naming the field.
    let unfiltered = TreeType::builder("Scenario")
        .field(
            "a",
            FieldSpec::new().path("x.dat").handler(Arc::new(DatHandler) as HandlerRef),
        )
        .build()
        .unwrap()
        .instantiate_with(&Registry::new(), Overrides::new())
        .unwrap();
    let err = unfiltered.read(dir.path()).unwrap_err();
    assert_eq!(err.field_chain(), vec!["a"]);
    assert!(matches!(err.root(), Error::PathNotFound { .. }));
}

#[test]
fn tree_round_trip() {
    let registry = builtin();
    let tree = TreeType::builder("Run")
        .field("params", FieldSpec::new().path("params.json"))
        .field("notes", FieldSpec::new().path("NOTES.md"))
        .build()
        .unwrap()
        .instantiate_with(&registry, Overrides::new())
        .unwrap();

    let mut data = Config::new();
    data.insert("params", json_to_value(json!({"dt": 0.25, "steps": 40, "tags": ["a", "b"]})));
    data.insert("notes", "first run\n");

    let first = tempfile::tempdir().unwrap();
    tree.write(first.path(), &data, false).unwrap();
    let read_back = tree.read(first.path()).unwrap();
    assert_eq!(read_back, data);

    let second = tempfile::tempdir().unwrap();
    let copy = second.path().join("copy");
    tree.write(&copy, &read_back, false).unwrap();
    assert_eq!(tree.read(&copy).unwrap(), data);
}

#[test]
fn missing_values_are_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let registry = builtin();
    let json: HandlerRef = Arc::new(treeconf::JsonHandler);

    let tree = TreeType::builder("Partial")
        .field("kept", FieldSpec::new().path("kept.json"))
        .field(
            "skipped",
            FieldSpec::new()
                .path("skipped.json")
                .handler(filter_missing(json, false)),
        )
        .build()
        .unwrap()
        .instantiate_with(&registry, Overrides::new())
        .unwrap();

    let data: Config = [("kept", Value::Integer(1)), ("skipped", MISSING)]
        .into_iter()
        .collect();
    tree.write(dir.path(), &data, false).unwrap();

    assert!(dir.path().join("kept.json").exists());
    assert!(!dir.path().join("skipped.json").exists());

    let config = tree.read(dir.path()).unwrap();
    assert_eq!(config.get("kept"), Some(&Value::Integer(1)));
    assert_eq!(config.get("skipped"), Some(&MISSING));
}

#[test]
fn read_preserves_declaration_order() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a", "b", "c"] {
        fs::write(dir.path().join(format!("{}.txt", name)), name).unwrap();
    }
    let registry = builtin();

    let orders = [
        ["a", "b", "c"],
        ["a", "c", "b"],
        ["b", "a", "c"],
        ["b", "c", "a"],
        ["c", "a", "b"],
        ["c", "b", "a"],
    ];
    for order in orders {
        let tree_type = TreeType::new(
            "Ordered",
            order
                .iter()
                .map(|name| (*name, FieldSpec::new().path(format!("{}.txt", name)))),
        )
        .unwrap();
        let config = tree_type
            .instantiate_with(&registry, Overrides::new())
            .unwrap()
            .read(dir.path())
            .unwrap();
        assert_eq!(keys(&config), order.to_vec());
    }
}

#[test]
fn explicit_handler_wins_over_extension() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("data.json"), "{\"raw\": true}").unwrap();
    let registry = builtin();

    let tree_type = TreeType::builder("Precedence")
        .field("as_text", FieldSpec::new().path("data.json").handler("text"))
        .field("as_json", FieldSpec::new().path("data.json"))
        .field("chosen", FieldSpec::new())
        .build()
        .unwrap();
    let tree = tree_type
        .instantiate_with(
            &registry,
            Overrides::new().set("chosen", Override::node("data.json", "text")),
        )
        .unwrap();

    let config = tree.read(dir.path()).unwrap();
    assert_eq!(config.get("as_text"), Some(&Value::from("{\"raw\": true}")));
    assert_eq!(config.get("as_json"), Some(&json_to_value(json!({"raw": true}))));
    assert_eq!(config.get("chosen"), config.get("as_text"));
}

#[test]
fn unresolvable_handler_fails_construction() {
    let tree_type = TreeType::builder("Unknown")
        .field("blob", FieldSpec::new().path("blob.xyz"))
        .build()
        .unwrap();

    let err = tree_type
        .instantiate_with(&builtin(), Overrides::new())
        .unwrap_err();
    assert!(matches!(err, Error::HandlerResolution { .. }));
    assert!(err.to_string().contains("blob"));
}

#[test]
fn nested_tree_over_two_level_fixture() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("inputs/mesh")).unwrap();
    fs::write(dir.path().join("run.json"), "{\"steps\": 3}").unwrap();
    fs::write(dir.path().join("inputs/forcing.txt"), "wind").unwrap();
    fs::write(dir.path().join("inputs/mesh/grid.json"), "[1, 2]").unwrap();

    let mesh = TreeType::builder("Mesh")
        .field("grid", FieldSpec::new().path("grid.json"))
        .build()
        .unwrap();
    let inputs = TreeType::builder("Inputs")
        .field("forcing", FieldSpec::new().path("forcing.txt"))
        .field("mesh", FieldSpec::new().path("mesh").handler(mesh))
        .build()
        .unwrap();
    let tree = TreeType::builder("Model")
        .field("run", FieldSpec::new().path("run.json"))
        .field("inputs", FieldSpec::new().path("inputs").handler(inputs))
        .build()
        .unwrap()
        .instantiate_with(&builtin(), Overrides::new())
        .unwrap();

    let config = tree.read(dir.path()).unwrap();
    assert_eq!(keys(&config), vec!["run", "inputs"]);

    let inputs = config.get("inputs").and_then(Value::as_config).unwrap();
    assert_eq!(keys(inputs), vec!["forcing", "mesh"]);
    assert_eq!(inputs.get("forcing"), Some(&Value::from("wind")));

    let mesh = inputs.get("mesh").and_then(Value::as_config).unwrap();
    assert_eq!(keys(mesh), vec!["grid"]);
    assert_eq!(mesh.get("grid"), Some(&json_to_value(json!([1, 2]))));

    let depths: Vec<(usize, &str)> = tree
        .walk()
        .into_iter()
        .map(|(depth, node)| (depth, node.name()))
        .collect();
    assert_eq!(
        depths,
        vec![(1, "run"), (1, "inputs"), (2, "forcing"), (2, "mesh"), (3, "grid")]
    );
}

#[test]
fn optional_subdirectory_reads_missing() {
    let registry = builtin();
    let extras = TreeType::builder("Extras")
        .field("readme", FieldSpec::new().path("README.md"))
        .build()
        .unwrap()
        .instantiate_with(&registry, Overrides::new())
        .unwrap();

    let tree = TreeType::builder("WithExtras")
        .field("params", FieldSpec::new().path("params.json"))
        .field(
            "extras",
            FieldSpec::new()
                .path("extras")
                .handler(Filter::missing(Arc::new(extras)).into_ref()),
        )
        .build()
        .unwrap()
        .instantiate_with(&registry, Overrides::new())
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("params.json"), "{}").unwrap();
    let config = tree.read(dir.path()).unwrap();
    assert_eq!(config.get("extras"), Some(&MISSING));

    fs::create_dir(dir.path().join("extras")).unwrap();
    fs::write(dir.path().join("extras/README.md"), "hello").unwrap();
    let config = tree.read(dir.path()).unwrap();
    let extras = config.get("extras").and_then(Value::as_config).unwrap();
    assert_eq!(extras.get("readme"), Some(&Value::from("hello")));
}

#[test]
fn contradictory_override_is_rejected() {
    let tree_type = TreeType::builder("Fixed")
        .field("params", FieldSpec::new().path("params.json"))
        .build()
        .unwrap();
    let registry = builtin();

    assert!(tree_type
        .instantiate_with(&registry, Overrides::new().set("params", "params.json"))
        .is_ok());
    assert!(matches!(
        tree_type.instantiate_with(&registry, Overrides::new().set("params", "other.json")),
        Err(Error::Construction { .. })
    ));
}

#[test]
fn decode_error_names_the_field() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("params.json"), "{broken").unwrap();

    let tree = TreeType::builder("Broken")
        .field("params", FieldSpec::new().path("params.json"))
        .build()
        .unwrap()
        .instantiate_with(&builtin(), Overrides::new())
        .unwrap();

    let err = tree.read(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Field { ref field, .. } if field == "params"));
    assert!(matches!(err.root(), Error::Decode { .. }));
}

#[test]
fn schema_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("schema.json");
    fs::write(
        &schema,
        r#"{
            "params": {"path": "params.json"},
            "notes": {"handler": "text"},
            "inputs": {"path": "inputs", "handler": {"tree": {
                "grid": {"path": "grid.json", "handler": "json"}
            }}}
        }"#,
    )
    .unwrap();

    let tree = TreeType::from_json_file("Declared", &schema)
        .unwrap()
        .instantiate_with(&builtin(), Overrides::new().set("notes", "notes.txt"))
        .unwrap();

    let mut inputs = Config::new();
    inputs.insert("grid", json_to_value(json!({"nx": 10})));
    let mut data = Config::new();
    data.insert("params", json_to_value(json!({"seed": 7})));
    data.insert("notes", "declared from json");
    data.insert("inputs", inputs);

    let base = dir.path().join("out");
    tree.write(&base, &data, false).unwrap();
    assert!(base.join("inputs/grid.json").is_file());
    assert_eq!(tree.read(&base).unwrap(), data);
}

#[test]
fn global_registry_instantiation() {
    treeconf::register_builtin();

    let tree = TreeType::builder("Global")
        .field("params", FieldSpec::new().path("params.json"))
        .build()
        .unwrap()
        .instantiate(Overrides::new())
        .unwrap();
    assert_eq!(tree.get("params").unwrap().handler_name(), "JsonHandler");
}
