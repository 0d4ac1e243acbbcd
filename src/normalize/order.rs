//! Canonical field order for every collection
//!
//! Known fields are moved into their preferred position; unknown fields keep
//! their relative order after them. Reference lists are sorted by id and
//! their entries ordered `<id>, [amount], name`.

use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::{Dataset, Pass};
use crate::error::Result;
use crate::store::{compare_values, get_path_mut, Record};
use crate::ui::Ui;

/// Ordering for a nested object, or for each object of a nested list
#[derive(Debug, Clone, Copy)]
pub struct NestedOrder {
    pub path: &'static [&'static str],
    pub keys: &'static [&'static str],
    /// Present for reference lists: the field the entries are sorted by
    pub sort_by: Option<&'static str>,
}

/// Scalar list sorted by a fixed rank instead of natural order
#[derive(Debug, Clone, Copy)]
pub struct RankedList {
    pub field: &'static str,
    pub ranks: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct CollectionOrder {
    pub collection: &'static str,
    pub fields: &'static [&'static str],
    pub nested: &'static [NestedOrder],
    pub ranked: &'static [RankedList],
}

const fn object(path: &'static [&'static str], keys: &'static [&'static str]) -> NestedOrder {
    NestedOrder {
        path,
        keys,
        sort_by: None,
    }
}

const fn list(
    path: &'static [&'static str],
    keys: &'static [&'static str],
    sort_by: &'static str,
) -> NestedOrder {
    NestedOrder {
        path,
        keys,
        sort_by: Some(sort_by),
    }
}

const SIZES: &[&str] = &["small", "large", "huge"];

const DAMAGE_DECK_FIELDS: &[&str] = &["name", "type", "amount", "text"];

pub static FIELD_ORDERS: &[CollectionOrder] = &[
    CollectionOrder {
        collection: "ships",
        fields: &[
            "id",
            "xws",
            "name",
            "size",
            "energy",
            "attack",
            "agility",
            "hull",
            "shields",
            "epic_points",
            "faction",
            "factions",
            "actions",
            "maneuvers",
            "maneuvers_energy",
        ],
        nested: &[],
        ranked: &[],
    },
    CollectionOrder {
        collection: "conditions",
        fields: &["id", "xws", "name", "unique", "image", "text"],
        nested: &[],
        ranked: &[],
    },
    CollectionOrder {
        collection: "damage-deck-core",
        fields: DAMAGE_DECK_FIELDS,
        nested: &[],
        ranked: &[],
    },
    CollectionOrder {
        collection: "damage-deck-core-tfa",
        fields: DAMAGE_DECK_FIELDS,
        nested: &[],
        ranked: &[],
    },
    CollectionOrder {
        collection: "pilots",
        fields: &[
            "id",
            "xws",
            "name",
            "unique",
            "faction",
            "ship",
            "skill",
            "points",
            "slots",
            "text",
            "image",
            "range",
            "conditions",
            "ship_override",
        ],
        nested: &[
            object(&["ship"], &["ship_id", "name"]),
            object(&["ship_override"], &["attack", "agility", "hull", "shields"]),
            list(&["conditions"], &["condition_id", "name"], "condition_id"),
        ],
        ranked: &[],
    },
    CollectionOrder {
        collection: "sources",
        fields: &[
            "id",
            "sku",
            "name",
            "wave",
            "image",
            "thumb",
            "contents",
            "released",
            "release_date",
            "announcement_date",
        ],
        nested: &[
            object(&["contents"], &["ships", "pilots", "upgrades", "conditions"]),
            list(&["contents", "ships"], &["ship_id", "amount", "name"], "ship_id"),
            list(&["contents", "pilots"], &["pilot_id", "amount", "name"], "pilot_id"),
            list(&["contents", "upgrades"], &["upgrade_id", "amount", "name"], "upgrade_id"),
            list(&["contents", "conditions"], &["condition_id", "amount", "name"], "condition_id"),
        ],
        ranked: &[],
    },
    CollectionOrder {
        collection: "upgrades",
        fields: &[
            "id",
            "xws",
            "name",
            "unique",
            "limited",
            "slot",
            "points",
            "faction",
            "ship",
            "ships",
            "size",
            "sizes",
            "energy",
            "attack",
            "range",
            "text",
            "effect",
            "grants",
            "conditions",
            "image",
        ],
        nested: &[
            list(&["ship"], &["ship_id", "name"], "ship_id"),
            list(&["ships"], &["ship_id", "name"], "ship_id"),
            list(&["conditions"], &["condition_id", "name"], "condition_id"),
            list(&["grants"], &["type", "name"], "type"),
        ],
        ranked: &[
            RankedList {
                field: "size",
                ranks: SIZES,
            },
            RankedList {
                field: "sizes",
                ranks: SIZES,
            },
        ],
    },
];

pub fn field_order(collection: &str) -> Option<&'static CollectionOrder> {
    FIELD_ORDERS.iter().find(|o| o.collection == collection)
}

/// Reorder the keys of `map`: listed keys first, in list order, then the rest
pub fn order_fields(map: Map<String, Value>, preferred: &[&str]) -> Map<String, Value> {
    let rank = |key: &str| preferred.iter().position(|p| *p == key).unwrap_or(preferred.len());
    let mut entries: Vec<(String, Value)> = map.into_iter().collect();
    entries.sort_by_key(|(key, _)| rank(key));
    entries.into_iter().collect()
}

fn sort_keys_alphabetically(map: Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(String, Value)> = map.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries.into_iter().collect()
}

fn apply_nested(value: &mut Value, nested: &NestedOrder) {
    match value {
        Value::Object(map) => {
            let taken = std::mem::take(map);
            *map = match nested.sort_by {
                // an unresolved `name -> amount` map
                Some(_) => sort_keys_alphabetically(taken),
                None => order_fields(taken, nested.keys),
            };
        }
        Value::Array(items) if items.iter().all(Value::is_object) => {
            for item in items.iter_mut() {
                if let Value::Object(map) = item {
                    *map = order_fields(std::mem::take(map), nested.keys);
                }
            }
            if let Some(field) = nested.sort_by {
                items.sort_by(|a, b| match (a.get(field), b.get(field)) {
                    (Some(a), Some(b)) => compare_values(a, b),
                    (a, b) => a.is_some().cmp(&b.is_some()),
                });
            }
        }
        Value::Array(items) => items.sort_by(compare_values),
        _ => {}
    }
}

fn apply_ranked(value: &mut Value, ranked: &RankedList) {
    let Value::Array(items) = value else {
        return;
    };
    let rank = |v: &Value| {
        v.as_str()
            .and_then(|s| ranked.ranks.iter().position(|r| *r == s))
            .unwrap_or(ranked.ranks.len())
    };
    items.sort_by(|a, b| match rank(a).cmp(&rank(b)) {
        Ordering::Equal => compare_values(a, b),
        other => other,
    });
}

/// Put one record into canonical order
pub fn order_record(record: Record, order: &CollectionOrder) -> Record {
    let mut record = order_fields(record, order.fields);
    for nested in order.nested {
        if let Some(value) = get_path_mut(&mut record, nested.path) {
            apply_nested(value, nested);
        }
    }
    for ranked in order.ranked {
        if let Some(value) = record.get_mut(ranked.field) {
            apply_ranked(value, ranked);
        }
    }
    record
}

pub struct OrderPass {
    orders: Vec<&'static CollectionOrder>,
}

impl OrderPass {
    pub fn new(orders: Vec<&'static CollectionOrder>) -> Self {
        Self { orders }
    }
}

impl Pass for OrderPass {
    fn name(&self) -> &'static str {
        "order"
    }

    fn targets(&self) -> Vec<String> {
        self.orders.iter().map(|o| o.collection.to_string()).collect()
    }

    fn lookups(&self) -> Vec<String> {
        Vec::new()
    }

    fn analyze(&self, data: &Dataset, ui: &mut dyn Ui) -> Result<()> {
        for order in &self.orders {
            let collection = data.get(order.collection)?;
            let fields: BTreeSet<&str> = collection
                .records
                .iter()
                .flat_map(|r| r.keys().map(String::as_str))
                .collect();
            let unknown: Vec<&str> = fields
                .iter()
                .copied()
                .filter(|f| !order.fields.iter().any(|p| p == f))
                .collect();
            ui.log(&format!("{}: {:?}", order.collection, fields));
            if !unknown.is_empty() {
                ui.log(&format!("  without a preferred position: {:?}", unknown));
            }
        }
        Ok(())
    }

    fn normalize(&mut self, data: &mut Dataset, _ui: &mut dyn Ui) -> Result<()> {
        for order in &self.orders {
            let collection = data.get_mut(order.collection)?;
            let records = std::mem::take(&mut collection.records);
            collection.records = records.into_iter().map(|r| order_record(r, order)).collect();
        }
        Ok(())
    }
}
