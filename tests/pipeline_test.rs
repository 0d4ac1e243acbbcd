//! End-to-end runs of the normalization passes and the schema synthesizer
//! over a small dataset written to a temporary directory.

use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempDir;

use xwing_data_tools::config::{Config, TableShape};
use xwing_data_tools::normalize::maneuvers::{normalize_ship, ManeuverPolicy};
use xwing_data_tools::normalize::references::{
    ReferenceKind, ReferenceSpec, ReferencesPass, RefreshIdsPass, Resolver,
};
use xwing_data_tools::normalize::{build_pass, Pass, PassContext, PassResolver};
use xwing_data_tools::schema::SchemaSynthesizer;
use xwing_data_tools::store::{record_id, Collection, Layout, Record, RecordStore};
use xwing_data_tools::ui::{SilentUi, Ui};
use xwing_data_tools::{DataError, Pipeline};

/// Ui that remembers what it was told and never answers
#[derive(Default)]
struct RecordingUi {
    sections: Vec<String>,
    logs: Vec<String>,
}

impl Ui for RecordingUi {
    fn section(&mut self, title: &str) {
        self.sections.push(title.to_string());
    }
    fn log(&mut self, message: &str) {
        self.logs.push(message.to_string());
    }
    fn show_record(&mut self, _record: &Record) {}
    fn ask(&mut self, _question: &str) -> io::Result<Option<String>> {
        Ok(None)
    }
}

fn write(dir: &Path, name: &str, value: Value) {
    let text = serde_json::to_string_pretty(&value).unwrap();
    fs::write(dir.join(format!("{}.js", name)), text).unwrap();
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(format!("{}.js", name))).unwrap()
}

fn write_dataset(dir: &Path) {
    write(
        dir,
        "ships",
        json!([
            {"name": "X-Wing", "faction": "Rebel Alliance", "attack": "3", "size": "small", "maneuvers": [[1]]},
            {"name": "TIE Fighter", "faction": "Galactic Empire", "attack": 2, "size": "small", "id": 1,
             "maneuvers": [[0, 0, 0], [1, 2, 2, 2, 1]]}
        ]),
    );
    write(
        dir,
        "pilots",
        json!([
            {"name": "Luke Skywalker", "ship": "X-Wing", "skill": 8, "image": "pilots/luke.png"},
            {"name": "Darth Vader", "id": 3, "ship": "TIE Fighter", "skill": 9}
        ]),
    );
    write(
        dir,
        "upgrades",
        json!([
            {"name": "Proton Torpedoes", "slot": "Torpedo", "attack": "4", "range": "2-3"},
            {"name": "Engine Upgrade", "slot": "Modification", "size": ["small", "large"], "ship": ["X-Wing"]}
        ]),
    );
    write(dir, "conditions", json!([{"name": "Fanatical Devotion", "id": 1, "unique": true}]));
    write(
        dir,
        "sources",
        json!([
            {
                "name": "Core Set",
                "contents": {
                    "ships": {"X-Wing": 1, "TIE Fighter": 2},
                    "pilots": {"Luke Skywalker": 1, "Darth Vader": 1},
                    "upgrades": {"Proton Torpedoes": 1},
                    "conditions": {}
                },
                "release_date": "2012-09-14",
                "announcement_date": "2011-08-01"
            }
        ]),
    );
}

fn default_passes(config: &Config, store: &RecordStore) -> Vec<Box<dyn Pass>> {
    let ctx = PassContext {
        config,
        store,
        reserved_ids: BTreeMap::new(),
    };
    PassResolver::new()
        .default_passes()
        .into_iter()
        .flat_map(|info| build_pass(info, &ctx))
        .collect()
}

fn run_defaults(store: &RecordStore, ui: &mut dyn Ui) -> Result<(), DataError> {
    let config = Config::default();
    let mut passes = default_passes(&config, store);
    Pipeline::new(store, Layout::Pretty).run(&mut passes, ui)
}

#[test]
fn test_full_normalize_run() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());
    let store = RecordStore::new(dir.path(), "js");

    let mut ui = RecordingUi::default();
    run_defaults(&store, &mut ui).unwrap();

    assert!(ui.sections.iter().any(|s| s == "references"));
    assert!(ui.logs.iter().any(|l| l == "BEFORE --------"));

    let ships = store.load("ships").unwrap();
    let x_wing = ships.find_by_name("X-Wing").unwrap();
    assert_eq!(x_wing["id"], 2);
    assert_eq!(x_wing["attack"], 3);
    assert!(x_wing.contains_key("factions"));
    assert!(!x_wing.contains_key("faction"));
    let rows = x_wing["maneuvers"].as_array().unwrap();
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|row| row.as_array().unwrap().len() == 13));

    // compacted layout puts every maneuver row on one line
    assert!(read(dir.path(), "ships").contains("[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]"));

    let upgrades = store.load("upgrades").unwrap();
    let engine = upgrades.find_by_name("Engine Upgrade").unwrap();
    assert_eq!(engine["sizes"], json!(["small", "large"]));
    assert_eq!(engine["ships"], json!([{"ship_id": 2, "name": "X-Wing"}]));

    let sources = store.load("sources").unwrap();
    let contents = &sources.records[0]["contents"];
    assert_eq!(
        contents["ships"],
        json!([
            {"ship_id": 2, "amount": 1, "name": "X-Wing"},
            {"ship_id": 1, "amount": 2, "name": "TIE Fighter"}
        ])
    );
    assert_eq!(contents["pilots"][1], json!({"pilot_id": 3, "amount": 1, "name": "Darth Vader"}));
    assert_eq!(contents["conditions"], json!([]));

    let pilots = store.load("pilots").unwrap();
    assert_eq!(
        pilots.find_by_name("Darth Vader").unwrap()["ship"],
        json!({"ship_id": 1, "name": "TIE Fighter"})
    );
}

#[test]
fn test_ids_are_unique_and_preserved() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());
    let store = RecordStore::new(dir.path(), "js");
    run_defaults(&store, &mut SilentUi::new()).unwrap();

    for name in ["ships", "pilots", "upgrades", "conditions", "sources"] {
        let collection = store.load(name).unwrap();
        let ids: Vec<i64> = collection.records.iter().map(|r| record_id(r).unwrap()).collect();
        let unique: HashSet<i64> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len(), "duplicate id in {}", name);
        assert!(ids.iter().all(|id| *id >= 0));
    }

    let ships = store.load("ships").unwrap();
    assert_eq!(ships.find_by_name("TIE Fighter").unwrap()["id"], 1);
    let pilots = store.load("pilots").unwrap();
    assert_eq!(pilots.find_by_name("Darth Vader").unwrap()["id"], 3);
    assert_eq!(pilots.find_by_name("Luke Skywalker").unwrap()["id"], 4);
}

#[test]
fn test_second_run_changes_nothing() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());
    let store = RecordStore::new(dir.path(), "js");

    run_defaults(&store, &mut SilentUi::new()).unwrap();
    let first: Vec<String> = ["ships", "pilots", "upgrades", "sources"]
        .iter()
        .map(|n| read(dir.path(), n))
        .collect();

    run_defaults(&store, &mut SilentUi::new()).unwrap();
    let second: Vec<String> = ["ships", "pilots", "upgrades", "sources"]
        .iter()
        .map(|n| read(dir.path(), n))
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_dangling_reference_saves_nothing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ships", json!([{"name": "X-Wing", "id": 1}]));
    write(dir.path(), "pilots", json!([{"name": "Luke Skywalker", "id": 1, "ship": "X-Wing"}]));
    write(dir.path(), "upgrades", json!([]));
    write(dir.path(), "conditions", json!([]));
    write(
        dir.path(),
        "sources",
        json!([{"name": "X-Wing Expansion Pack", "id": 1,
                "contents": {"ships": {"X-Wing": 1}, "pilots": {"Unknown Pilot": 1}, "upgrades": {}}}]),
    );
    let sources_before = read(dir.path(), "sources");
    let pilots_before = read(dir.path(), "pilots");

    let store = RecordStore::new(dir.path(), "js");
    let mut passes: Vec<Box<dyn Pass>> = vec![Box::new(ReferencesPass::standard())];
    let result = Pipeline::new(&store, Layout::Pretty).run(&mut passes, &mut SilentUi::new());

    match result {
        Err(DataError::DanglingReference { target, value, .. }) => {
            assert_eq!(target, "pilots");
            assert!(value.contains("Unknown Pilot"));
        }
        other => panic!("expected a dangling reference, got {:?}", other),
    }
    assert_eq!(read(dir.path(), "sources"), sources_before);
    assert_eq!(read(dir.path(), "pilots"), pilots_before);
}

#[test]
fn test_resolve_pilot_by_name() {
    let spec = ReferenceSpec {
        source: "upgrades",
        path: &["pilot"],
        target: "pilots",
        id_field: "pilot_id",
        kind: ReferenceKind::Simple,
        amounts: &[],
    };
    let pilots = Collection::from_value(
        "pilots",
        json!([{"id": 3, "name": "Darth Vader"}, {"id": 7, "name": "Darth Vader"}]),
    )
    .unwrap();
    let resolver = Resolver::new(&spec, &pilots);

    let resolved = resolver.resolve(&json!("Darth Vader"), &Record::new()).unwrap();
    assert_eq!(resolved, json!({"pilot_id": 3, "name": "Darth Vader"}));
    assert_eq!(resolver.resolve(&resolved, &Record::new()).unwrap(), resolved);
}

#[test]
fn test_maneuver_table_is_padded() {
    let mut ship = json!({"name": "X-Wing", "size": "small", "maneuvers": [[1]]})
        .as_object()
        .unwrap()
        .clone();
    let policy = ManeuverPolicy::new("small", TableShape::new(10, 6));

    normalize_ship(&mut ship, &policy).unwrap();

    let rows = ship["maneuvers"].as_array().unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0], json!([1, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
    assert!(rows[1..].iter().all(|row| row == &json!([0, 0, 0, 0, 0, 0, 0, 0, 0, 0])));
}

#[test]
fn test_load_save_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());
    let store = RecordStore::new(dir.path(), "js");

    for name in ["ships", "pilots", "upgrades", "conditions", "sources"] {
        let before = read(dir.path(), name);
        store.save(&store.load(name).unwrap()).unwrap();
        assert_eq!(read(dir.path(), name), before, "{} changed", name);
    }
}

#[test]
fn test_schema_required_fields() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_dataset(dir.path());
    let store = RecordStore::new(dir.path(), "js");
    run_defaults(&store, &mut SilentUi::new()).unwrap();

    SchemaSynthesizer::new(&store, out.path(), "https://example.org/schemas/")
        .run(&mut SilentUi::new())
        .unwrap();

    let pilots: Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("pilots.json")).unwrap()).unwrap();
    assert_eq!(pilots["required"], json!(["name", "ship", "skill", "id"]));
    assert_eq!(pilots["additionalProperties"], false);
    assert_eq!(pilots["id"], "https://example.org/schemas/pilots.json#");

    let records = store.load("pilots").unwrap().records;
    for field in pilots["required"].as_array().unwrap() {
        let field = field.as_str().unwrap();
        assert!(records.iter().all(|r| r.contains_key(field)));
    }
    assert!(pilots["properties"].get("image").is_some());

    let definitions: Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("definitions.json")).unwrap()).unwrap();
    assert_eq!(
        definitions["definitions"]["faction"]["enum"],
        json!(["Galactic Empire", "Rebel Alliance"])
    );
    assert_eq!(
        definitions["definitions"]["slot"]["enum"],
        json!(["Modification", "Torpedo"])
    );
}

#[test]
fn test_refresh_ids_after_renumbering() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());
    let store = RecordStore::new(dir.path(), "js");
    run_defaults(&store, &mut SilentUi::new()).unwrap();

    let mut ships = store.load("ships").unwrap();
    for ship in ships.records.iter_mut() {
        if ship["name"] == "X-Wing" {
            ship.insert("id".to_string(), json!(20));
        }
    }
    store.save(&ships).unwrap();

    Pipeline::new(&store, Layout::Pretty)
        .run_pass(&mut RefreshIdsPass::standard(), &mut SilentUi::new())
        .unwrap();

    let pilots = store.load("pilots").unwrap();
    let luke = pilots.find_by_name("Luke Skywalker").unwrap();
    assert_eq!(luke["ship"], json!({"ship_id": 20, "name": "X-Wing"}));

    let sources = store.load("sources").unwrap();
    let core = sources.find_by_name("Core Set").unwrap();
    assert_eq!(core["contents"]["ships"][0], json!({"ship_id": 20, "amount": 1, "name": "X-Wing"}));

    let upgrades = store.load("upgrades").unwrap();
    let engine = upgrades.find_by_name("Engine Upgrade").unwrap();
    assert_eq!(engine["ships"], json!([{"ship_id": 20, "name": "X-Wing"}]));
}
