//! Hand-declared metadata merged into the inferred schemas

use serde_json::{json, Map, Value};

use super::definitions::shared_ref;

/// One schema document and the collections it is inferred from
#[derive(Debug, Clone, Copy)]
pub struct SchemaTarget {
    pub target: &'static str,
    pub title: &'static str,
    pub sources: &'static [&'static str],
    /// Appended to the observed field order, for keys only found in
    /// declared nested schemas
    pub order_tail: &'static [&'static str],
    pub fields: fn() -> Map<String, Value>,
}

pub static SCHEMA_TARGETS: &[SchemaTarget] = &[
    SchemaTarget {
        target: "ships",
        title: "Schema for ships data file",
        sources: &["ships"],
        order_tail: &[],
        fields: ship_fields,
    },
    SchemaTarget {
        target: "pilots",
        title: "Schema for pilots data file",
        sources: &["pilots"],
        order_tail: &[],
        fields: pilot_fields,
    },
    SchemaTarget {
        target: "upgrades",
        title: "Schema for upgrades data file",
        sources: &["upgrades"],
        order_tail: &["type"],
        fields: upgrade_fields,
    },
    SchemaTarget {
        target: "conditions",
        title: "Schema for conditions data file",
        sources: &["conditions"],
        order_tail: &[],
        fields: condition_fields,
    },
    SchemaTarget {
        target: "sources",
        title: "Schema for sources data file",
        sources: &["sources"],
        order_tail: &[],
        fields: source_fields,
    },
    SchemaTarget {
        target: "damage-deck",
        title: "Schema for damage deck data files (original and tfa)",
        sources: &["damage-deck-core-tfa", "damage-deck-core"],
        order_tail: &[],
        fields: damage_deck_fields,
    },
];

pub fn get_target(name: &str) -> Option<&'static SchemaTarget> {
    SCHEMA_TARGETS.iter().find(|t| t.target == name)
}

fn described_ref(description: &str, definition: &str) -> Value {
    let mut node = json!({ "description": description });
    if let (Some(node), Value::Object(reference)) = (node.as_object_mut(), shared_ref(definition)) {
        node.extend(reference);
    }
    node
}

/// Schema of a resolved reference, `{<id_field>, name}` plus `amount` for
/// contents lists
fn reference(id_field: &str, description: &str, with_amount: bool) -> Value {
    let mut properties = Map::new();
    properties.insert(
        id_field.to_string(),
        json!({ "description": "Id of the referenced record.", "type": "integer", "minimum": 0 }),
    );
    let mut required = vec![json!(id_field)];
    if with_amount {
        properties.insert(
            "amount".into(),
            json!({ "description": "How many copies are included.", "type": "integer", "minimum": 1 }),
        );
        required.push(json!("amount"));
    }
    properties.insert(
        "name".into(),
        json!({ "description": "Name of the referenced record.", "type": "string", "minLength": 1 }),
    );
    required.push(json!("name"));

    json!({
        "description": description,
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

fn reference_list(id_field: &str, description: &str, item: &str, with_amount: bool) -> Value {
    json!({
        "description": description,
        "type": "array",
        "uniqueItems": true,
        "items": reference(id_field, item, with_amount)
    })
}

fn collect(fields: Value) -> Map<String, Value> {
    match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn maneuver_rows(description: &str, directions: u64, maximum: u64) -> Value {
    json!({
        "description": description,
        "uniqueItems": false,
        "items": {
            "description": "Maneuvers at one speed, indexed by direction.",
            "type": "array",
            "uniqueItems": false,
            "maxItems": directions,
            "items": {
                "description": "0 unavailable, otherwise the maneuver difficulty or cost.",
                "type": "integer",
                "minimum": 0,
                "maximum": maximum
            }
        }
    })
}

pub fn ship_fields() -> Map<String, Value> {
    collect(json!({
        "name": { "description": "The ship's name as written on the card.", "minLength": 1 },
        "factions": {
            "description": "Factions that field this ship.",
            "uniqueItems": true,
            "items": described_ref("A faction.", "faction")
        },
        "actions": {
            "description": "Actions on the ship's action bar.",
            "uniqueItems": true,
            "items": described_ref("An action.", "action")
        },
        "attack": { "description": "Primary weapon value.", "minimum": 0 },
        "agility": { "description": "Agility value.", "minimum": 0 },
        "hull": { "description": "Hull value.", "minimum": 0 },
        "shields": { "description": "Shield value.", "minimum": 0 },
        "energy": { "description": "Energy value of a huge ship.", "minimum": 1 },
        "epic_points": { "description": "Epic play points value.", "type": "number", "minimum": 0 },
        "size": described_ref("The ship's size.", "size"),
        "maneuvers": maneuver_rows("Maneuver dial, one row per speed.", 13, 3),
        "maneuvers_energy": maneuver_rows("Energy cost of each maneuver of a huge ship.", 5, 3),
        "xws": { "description": "XWS id of the ship.", "minLength": 1 },
        "id": { "description": "Unique id within the ships data file.", "minimum": 0 }
    }))
}

pub fn pilot_fields() -> Map<String, Value> {
    collect(json!({
        "id": { "description": "Unique id within the pilots data file.", "minimum": 0 },
        "name": { "description": "The pilot's name as written on the card.", "minLength": 1 },
        "unique": { "description": "Whether the pilot's name is unique." },
        "ship": reference("ship_id", "The ship this pilot flies.", false),
        "skill": {
            "description": "Pilot skill.",
            "anyOf": [
                { "description": "Numeric skill.", "type": "integer", "minimum": 0 },
                { "description": "Variable skill.", "type": "string", "enum": ["?"] }
            ]
        },
        "points": {
            "description": "Squad points cost.",
            "anyOf": [
                { "description": "Numeric cost.", "type": "integer" },
                { "description": "Variable cost.", "type": "string", "enum": ["?"] }
            ]
        },
        "slots": {
            "description": "Upgrade slots of the pilot.",
            "uniqueItems": false,
            "items": described_ref("A slot.", "slot")
        },
        "text": { "description": "The pilot's ability text.", "minLength": 1 },
        "image": described_ref("Path of the pilot card image.", "image_file_path"),
        "faction": described_ref("The pilot's faction.", "faction"),
        "ship_override": {
            "description": "Ship stats this pilot replaces.",
            "type": "object",
            "properties": {
                "attack": { "description": "Overridden attack.", "type": "integer", "minimum": 0 },
                "agility": { "description": "Overridden agility.", "type": "integer", "minimum": 0 },
                "hull": { "description": "Overridden hull.", "type": "integer", "minimum": 0 },
                "shields": { "description": "Overridden shields.", "type": "integer", "minimum": 0 }
            },
            "additionalProperties": false
        },
        "range": described_ref("Range of the pilot's ability.", "range"),
        "conditions": reference_list("condition_id", "Conditions related to the pilot.", "A condition.", false),
        "xws": { "description": "XWS id of the pilot.", "minLength": 1 }
    }))
}

pub fn upgrade_fields() -> Map<String, Value> {
    let granted = |kind: &str| {
        json!({
            "description": format!("A granted {}.", kind),
            "type": "object",
            "properties": {
                "type": { "description": "Kind of improvement.", "type": "string", "enum": [kind] },
                "name": shared_ref(kind)
            },
            "required": ["type", "name"],
            "additionalProperties": false
        })
    };

    collect(json!({
        "id": { "description": "Unique id within the upgrades data file.", "minimum": 0 },
        "name": { "description": "The upgrade's name as written on the card.", "minLength": 1 },
        "unique": { "description": "Whether the upgrade's name is unique." },
        "limited": { "description": "Whether the upgrade has the Limited trait." },
        "slot": described_ref("The slot used by this upgrade.", "slot"),
        "points": { "description": "Squad points cost." },
        "attack": { "description": "Secondary weapon value.", "minimum": 1 },
        "range": described_ref("Secondary weapon range.", "range"),
        "energy": { "description": "Energy cost.", "minimum": 0 },
        "text": { "description": "The upgrade's text as written on the card.", "minLength": 1 },
        "effect": { "description": "Text of a related effect, like a bomb token.", "minLength": 1 },
        "sizes": {
            "description": "Ship sizes the upgrade is restricted to.",
            "uniqueItems": true,
            "items": described_ref("A ship size.", "size")
        },
        "ships": reference_list("ship_id", "Ships the upgrade is restricted to.", "A ship.", false),
        "faction": described_ref("Faction the upgrade is restricted to.", "faction"),
        "grants": {
            "description": "Improvements granted to the equipped ship.",
            "uniqueItems": false,
            "items": {
                "description": "One improvement.",
                "anyOf": [granted("action"), granted("slot")]
            }
        },
        "conditions": reference_list("condition_id", "Conditions related to the upgrade.", "A condition.", false),
        "image": described_ref("Path of the upgrade card image.", "image_file_path"),
        "xws": { "description": "XWS id of the upgrade.", "minLength": 1 }
    }))
}

pub fn condition_fields() -> Map<String, Value> {
    collect(json!({
        "id": { "description": "Unique id within the conditions data file.", "minimum": 0 },
        "name": { "description": "The condition's name as written on the card.", "minLength": 1 },
        "unique": { "description": "Whether the condition's name is unique." },
        "text": { "description": "The condition's effect.", "minLength": 1 },
        "image": described_ref("Path of the condition card image.", "image_file_path"),
        "xws": { "description": "XWS id of the condition.", "minLength": 1 }
    }))
}

pub fn source_fields() -> Map<String, Value> {
    collect(json!({
        "id": { "description": "Unique id within the sources data file.", "minimum": 0 },
        "name": { "description": "The source's name as written on the package.", "minLength": 1 },
        "sku": { "description": "Product key.", "pattern": "^SWX[0-9]+$", "minLength": 1 },
        "wave": {
            "description": "Wave or product line.",
            "anyOf": [
                { "description": "Wave number.", "type": "integer", "minimum": 0 },
                { "description": "Product line.", "type": "string", "minLength": 1 }
            ]
        },
        "image": described_ref("Path of the package image.", "image_file_path"),
        "thumb": described_ref("Path of the package thumbnail.", "image_file_path"),
        "contents": {
            "description": "What the package contains.",
            "properties": {
                "ships": reference_list("ship_id", "Ships in the package.", "A ship.", true),
                "pilots": reference_list("pilot_id", "Pilots in the package.", "A pilot.", true),
                "upgrades": reference_list("upgrade_id", "Upgrades in the package.", "An upgrade.", true),
                "conditions": reference_list("condition_id", "Conditions in the package.", "A condition.", true)
            },
            "required": ["ships", "pilots", "upgrades"],
            "additionalProperties": false
        },
        "released": { "description": "Whether the source has been released." },
        "release_date": { "description": "Release date.", "format": "date" },
        "announcement_date": { "description": "Announcement date.", "format": "date" }
    }))
}

pub fn damage_deck_fields() -> Map<String, Value> {
    collect(json!({
        "name": { "description": "The card's name as written on the card.", "minLength": 1 },
        "text": { "description": "The card's effect.", "minLength": 1 },
        "type": { "description": "What the card damages when dealt faceup.", "enum": [] },
        "amount": { "description": "Copies of the card in the deck.", "minimum": 0 }
    }))
}
