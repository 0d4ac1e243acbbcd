use serde_json::{Map, Value};

use crate::store::compare_values;

/// Canonical keyword order for every schema object
pub const PREFERRED_ORDER: &[&str] = &[
    "$schema",
    "id",
    "title",
    "type",
    "default",
    "description",
    "definitions",
    "properties",
    "required",
    "additionalProperties",
    "uniqueItems",
    "additionalItems",
    "$ref",
    "oneOf",
    "allOf",
    "anyOf",
    "not",
    "$merge",
    "source",
    "with",
    "enum",
    "minLength",
    "maxLength",
    "format",
    "pattern",
    "multipleOf",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "maxItems",
    "minItems",
    "items",
];

/// Reorder `map` by position in `preferred`; unknown keys follow in their
/// current order
pub fn sort_keys(map: Map<String, Value>, preferred: &[String]) -> Map<String, Value> {
    let rank = |key: &str| preferred.iter().position(|p| p == key).unwrap_or(usize::MAX);

    let mut entries: Vec<(String, Value)> = map.into_iter().collect();
    entries.sort_by_key(|(key, _)| rank(key));
    entries.into_iter().collect()
}

/// Keyword and property ordering applied to a whole schema document
pub struct SchemaOrder {
    keywords: Vec<String>,
    properties: Vec<String>,
    definitions: Vec<String>,
}

impl SchemaOrder {
    /// `properties` orders the keys of every `properties` map
    pub fn new(properties: Vec<String>) -> Self {
        Self {
            keywords: PREFERRED_ORDER.iter().map(|k| k.to_string()).collect(),
            properties,
            definitions: Vec::new(),
        }
    }

    /// Order the entries of `definitions` maps
    pub fn with_definitions(mut self, definitions: Vec<String>) -> Self {
        self.definitions = definitions;
        self
    }

    fn apply_entries(&self, map: Map<String, Value>, order: &[String]) -> Value {
        Value::Object(
            sort_keys(map, order)
                .into_iter()
                .map(|(name, node)| (name, self.apply(node)))
                .collect(),
        )
    }

    pub fn apply(&self, node: Value) -> Value {
        match node {
            Value::Object(map) => Value::Object(self.apply_object(map, &self.keywords)),
            Value::Array(items) => Value::Array(items.into_iter().map(|i| self.apply(i)).collect()),
            other => other,
        }
    }

    fn apply_object(&self, map: Map<String, Value>, order: &[String]) -> Map<String, Value> {
        let is_schema = map.get("type").and_then(Value::as_str) == Some("object") && map.contains_key("properties");

        let map = map
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::Object(inner) if is_schema && key == "properties" => {
                        self.apply_entries(inner, &self.properties)
                    }
                    Value::Object(inner) if key == "definitions" => self.apply_entries(inner, &self.definitions),
                    Value::Object(inner) => Value::Object(self.apply_object(inner, &self.keywords)),
                    Value::Array(items) if items.iter().all(Value::is_object) => {
                        Value::Array(items.into_iter().map(|i| self.apply(i)).collect())
                    }
                    Value::Array(mut items) => {
                        if key != "required" {
                            items.sort_by(compare_values);
                        }
                        Value::Array(items)
                    }
                    other => other,
                };
                (key, value)
            })
            .collect();

        sort_keys(map, order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(value: &Value) -> Vec<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    #[test]
    fn test_keywords_follow_preferred_order() {
        let node = json!({
            "properties": {},
            "type": "object",
            "required": ["b", "a"],
            "title": "T",
            "$schema": "s"
        });
        let ordered = SchemaOrder::new(Vec::new()).apply(node);

        assert_eq!(keys(&ordered), vec!["$schema", "title", "type", "properties", "required"]);
        assert_eq!(ordered["required"], json!(["b", "a"]));
    }

    #[test]
    fn test_properties_follow_field_order() {
        let node = json!({
            "type": "object",
            "properties": {
                "xws": {"type": "string"},
                "name": {"minLength": 1, "type": "string", "description": "Name."},
                "extra": {"type": "integer"},
                "id": {"type": "integer"}
            }
        });
        let order = SchemaOrder::new(vec!["name".into(), "id".into(), "xws".into()]);
        let ordered = order.apply(node);

        assert_eq!(keys(&ordered["properties"]), vec!["name", "id", "xws", "extra"]);
        assert_eq!(
            keys(&ordered["properties"]["name"]),
            vec!["type", "description", "minLength"]
        );
    }

    #[test]
    fn test_scalar_arrays_sorted() {
        let node = json!({"enum": ["b", "c", "a"], "anyOf": [{"type": "string"}, {"enum": [3, 1]}]});
        let ordered = SchemaOrder::new(Vec::new()).apply(node);

        assert_eq!(ordered["enum"], json!(["a", "b", "c"]));
        assert_eq!(ordered["anyOf"][1]["enum"], json!([1, 3]));
        assert_eq!(ordered["anyOf"][0], json!({"type": "string"}));
    }

    #[test]
    fn test_non_schema_properties_key_uses_keywords() {
        let node = json!({"properties": {"title": "x", "$schema": "y"}});
        let ordered = SchemaOrder::new(vec!["title".into()]).apply(node);

        assert_eq!(keys(&ordered["properties"]), vec!["$schema", "title"]);
    }
}
