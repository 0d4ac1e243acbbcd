//! Schema inference from observed records

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::types::{JsonType, COMBINING_KEYWORDS};
use crate::store::{sort_unique, Record};

/// Keys of the first record, in order, that every record carries, minus `excluded`
pub fn infer_required(records: &[Record], excluded: &[&str]) -> Vec<String> {
    let Some(first) = records.first() else {
        return Vec::new();
    };

    first
        .keys()
        .filter(|key| !excluded.contains(&key.as_str()))
        .filter(|key| records.iter().all(|r| r.contains_key(key.as_str())))
        .cloned()
        .collect()
}

/// Every top-level key in first-seen order, followed by the keys of nested
/// objects, so nested `properties` maps can be ordered too
pub fn observed_field_order(records: &[Record]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut push = |key: &str, order: &mut Vec<String>| {
        if !order.iter().any(|k| k == key) {
            order.push(key.to_string());
        }
    };

    for record in records {
        for key in record.keys() {
            push(key, &mut order);
        }
    }
    for record in records {
        for value in record.values() {
            if let Value::Object(nested) = value {
                for key in nested.keys() {
                    push(key, &mut order);
                }
            }
        }
    }
    order
}

/// Schema node for one field, built up one observed value at a time
#[derive(Debug, Clone)]
pub struct SchemaNode {
    node: Map<String, Value>,
    /// Observed types; `None` when the declared metadata fixes the type
    types: Option<BTreeSet<JsonType>>,
}

impl SchemaNode {
    /// Start from the declared metadata. A declared `type` is kept as is.
    pub fn new(declared: Option<&Value>) -> Self {
        let mut node = Map::new();
        node.insert("type".to_string(), Value::Array(Vec::new()));
        let mut types = Some(BTreeSet::new());

        if let Some(Value::Object(declared)) = declared {
            for (key, value) in declared {
                if key == "type" {
                    types = None;
                }
                node.insert(key.clone(), value.clone());
            }
        }

        Self { node, types }
    }

    pub fn observe(&mut self, value: &Value) {
        if let Some(types) = self.types.as_mut() {
            types.insert(JsonType::of(value));
        }

        if let Some(Value::Array(values)) = self.node.get_mut("enum") {
            match value {
                Value::Array(items) => values.extend(items.iter().cloned()),
                other => values.push(other.clone()),
            }
            sort_unique(values);
        }
    }

    /// Final node: the type set collapsed when it has one member, and
    /// dropped entirely when a combining keyword is declared
    pub fn finish(self) -> Value {
        let combined = COMBINING_KEYWORDS.iter().any(|k| self.node.contains_key(*k));
        let observed = self.types.map(|types| {
            let mut names: Vec<Value> = types.iter().map(|t| Value::from(t.as_str())).collect();
            if names.len() == 1 {
                names.remove(0)
            } else {
                Value::Array(names)
            }
        });

        let node = self
            .node
            .into_iter()
            .filter_map(|(key, value)| match key.as_str() {
                "type" if combined => None,
                "type" => Some((key, observed.clone().unwrap_or(value))),
                _ => Some((key, value)),
            })
            .collect();
        Value::Object(node)
    }
}

/// Properties and required list inferred for one collection
#[derive(Debug, Clone)]
pub struct InferredSchema {
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
    pub field_order: Vec<String>,
}

/// Infer the schema of `records`, seeding each field with `declared[field]`
pub fn infer_schema(records: &[Record], declared: &Map<String, Value>, excluded: &[&str]) -> InferredSchema {
    let mut nodes: Vec<(String, SchemaNode)> = Vec::new();

    for record in records {
        for (field, value) in record {
            let index = match nodes.iter().position(|(name, _)| name == field) {
                Some(index) => index,
                None => {
                    nodes.push((field.clone(), SchemaNode::new(declared.get(field))));
                    nodes.len() - 1
                }
            };
            nodes[index].1.observe(value);
        }
    }

    InferredSchema {
        properties: nodes.into_iter().map(|(name, node)| (name, node.finish())).collect(),
        required: infer_required(records, excluded),
        field_order: observed_field_order(records),
    }
}
