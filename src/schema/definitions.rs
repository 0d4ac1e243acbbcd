use serde_json::{json, Map, Value};
use tracing::debug;

use super::order::SchemaOrder;
use super::types::DRAFT_04;
use crate::store::{sort_unique, Record};

pub const DEFINITIONS_TARGET: &str = "definitions";

/// Record field -> shared definition it feeds
pub const SHARED_FIELDS: &[(&str, &str)] = &[
    ("faction", "faction"),
    ("factions", "faction"),
    ("action", "action"),
    ("actions", "action"),
    ("slot", "slot"),
    ("slots", "slot"),
    ("size", "size"),
    ("sizes", "size"),
];

pub const DEFINITION_ORDER: &[&str] = &["faction", "size", "slot", "action", "image_file_path", "range"];

fn definition_for(field: &str) -> Option<&'static str> {
    SHARED_FIELDS.iter().find(|(f, _)| *f == field).map(|(_, d)| *d)
}

/// `$ref` pointing at a shared definition
pub fn shared_ref(definition: &str) -> Value {
    json!({ "$ref": format!("{}.json#/definitions/{}", DEFINITIONS_TARGET, definition) })
}

/// Enums shared across every collection
#[derive(Debug, Clone)]
pub struct SharedDefinitions {
    definitions: Map<String, Value>,
}

impl SharedDefinitions {
    pub fn new() -> Self {
        let enumerated = |description: &str| {
            json!({
                "description": description,
                "type": "string",
                "enum": []
            })
        };

        let mut definitions = Map::new();
        definitions.insert("faction".into(), enumerated("Faction name."));
        definitions.insert("action".into(), enumerated("Action name."));
        definitions.insert("slot".into(), enumerated("Upgrade slot name."));
        definitions.insert("size".into(), enumerated("Ship size."));
        definitions.insert(
            "image_file_path".into(),
            json!({
                "description": "Relative path to an image file.",
                "type": "string",
                "pattern": "^[a-zA-Z0-9_\\-/\\.()' ]+\\.(png|jpg)$"
            }),
        );
        definitions.insert(
            "range".into(),
            json!({
                "description": "Single range or range band.",
                "type": "string",
                "pattern": "^[1-5](-[1-5])?$"
            }),
        );

        Self { definitions }
    }

    /// Feed every mapped top-level field of `record` into its enum
    pub fn observe(&mut self, record: &Record) {
        for (field, value) in record {
            let Some(name) = definition_for(field) else {
                continue;
            };
            let Some(Value::Array(values)) = self
                .definitions
                .get_mut(name)
                .and_then(|d| d.get_mut("enum"))
            else {
                continue;
            };

            match value {
                Value::Array(items) => values.extend(items.iter().cloned()),
                other => values.push(other.clone()),
            }
            sort_unique(values);
            debug!("{} observed for definition {}", field, name);
        }
    }

    pub fn enum_values(&self, definition: &str) -> Option<&Vec<Value>> {
        self.definitions.get(definition)?.get("enum")?.as_array()
    }

    /// The `definitions.json` document
    pub fn document(&self, host: &str) -> Value {
        let document = json!({
            "$schema": DRAFT_04,
            "id": format!("{}{}.json#", host, DEFINITIONS_TARGET),
            "title": "Schema for common fields in data files",
            "definitions": Value::Object(self.definitions.clone()),
        });

        SchemaOrder::new(Vec::new())
            .with_definitions(DEFINITION_ORDER.iter().map(|d| d.to_string()).collect())
            .apply(document)
    }
}

impl Default for SharedDefinitions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_observe_merges_singular_and_plural() {
        let mut shared = SharedDefinitions::new();
        shared.observe(&record(json!({"name": "X-Wing", "factions": ["Rebel Alliance"], "size": "small"})));
        shared.observe(&record(json!({"name": "Luke", "faction": "Rebel Alliance"})));
        shared.observe(&record(json!({"name": "TIE", "factions": ["Galactic Empire"], "actions": ["Focus", "Evade"]})));
        shared.observe(&record(json!({"name": "Engine Upgrade", "sizes": ["large", "small"]})));

        assert_eq!(
            shared.enum_values("faction").unwrap(),
            &vec![json!("Galactic Empire"), json!("Rebel Alliance")]
        );
        assert_eq!(shared.enum_values("action").unwrap(), &vec![json!("Evade"), json!("Focus")]);
        assert_eq!(shared.enum_values("size").unwrap(), &vec![json!("large"), json!("small")]);
        assert!(shared.enum_values("slot").unwrap().is_empty());
    }

    #[test]
    fn test_document_shape() {
        let mut shared = SharedDefinitions::new();
        shared.observe(&record(json!({"slot": "Elite"})));
        let document = shared.document("https://example.org/schema/");

        let keys: Vec<&str> = document.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["$schema", "id", "title", "definitions"]);
        assert_eq!(document["id"], "https://example.org/schema/definitions.json#");

        let definitions: Vec<&str> = document["definitions"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(definitions, DEFINITION_ORDER.to_vec());
        assert_eq!(document["definitions"]["slot"]["enum"], json!(["Elite"]));

        let slot: Vec<&str> = document["definitions"]["slot"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(slot, vec!["type", "description", "enum"]);
    }

    #[test]
    fn test_shared_ref() {
        assert_eq!(shared_ref("faction"), json!({"$ref": "definitions.json#/definitions/faction"}));
    }
}
