use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Gaps between a synthesized schema and its declared metadata
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AuditReport {
    pub missing_descriptions: Vec<String>,
    pub missing_unique_items: Vec<String>,
    pub declared_not_observed: Vec<String>,
    pub observed_not_declared: Vec<String>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.missing_descriptions.is_empty()
            && self.missing_unique_items.is_empty()
            && self.declared_not_observed.is_empty()
            && self.observed_not_declared.is_empty()
    }

    /// Human readable lines, one per finding
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut section = |title: &str, items: &[String]| {
            if !items.is_empty() {
                lines.push(format!("{}: {}", title, items.join(", ")));
            }
        };
        section("Missing description", &self.missing_descriptions);
        section("Items without uniqueItems", &self.missing_unique_items);
        section("Declared but never observed", &self.declared_not_observed);
        section("Observed but never declared", &self.observed_not_declared);
        lines
    }
}

/// Audit the `properties` of a collection schema against its declared fields
pub fn audit(properties: &Map<String, Value>, declared: &Map<String, Value>) -> AuditReport {
    let mut report = AuditReport::default();

    for (name, node) in properties {
        check_node(node, name, &mut report);
    }

    let observed: BTreeSet<&String> = properties.keys().collect();
    let expected: BTreeSet<&String> = declared.keys().collect();
    report.declared_not_observed = expected.difference(&observed).map(|s| s.to_string()).collect();
    report.observed_not_declared = observed.difference(&expected).map(|s| s.to_string()).collect();

    report
}

fn check_node(node: &Value, path: &str, report: &mut AuditReport) {
    let Value::Object(map) = node else {
        return;
    };

    if !map.contains_key("description") {
        report.missing_descriptions.push(path.to_string());
    }
    if map.contains_key("items") && !map.contains_key("uniqueItems") {
        report.missing_unique_items.push(path.to_string());
    }

    for (key, value) in map {
        match value {
            Value::Object(children) if key == "properties" => {
                for (name, child) in children {
                    check_node(child, &format!("{}.{}", path, name), report);
                }
            }
            Value::Object(_) => check_node(value, &format!("{}.{}", path, key), report),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_node(item, &format!("{}.{}[{}]", path, key, i), report);
                }
            }
            _ => {}
        }
    }
}
