//! Scalar type fixes for fields that were entered inconsistently

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::{Dataset, Pass};
use crate::error::{DataError, Result};
use crate::store::{get_path, get_path_mut, path_label, record_label, Record};
use crate::ui::Ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    IntegerToString,
    StringToInteger,
}

#[derive(Debug, Clone, Copy)]
pub struct CoercionRule {
    pub collection: &'static str,
    pub path: &'static [&'static str],
    pub coercion: Coercion,
}

const fn rule(
    collection: &'static str,
    path: &'static [&'static str],
    coercion: Coercion,
) -> CoercionRule {
    CoercionRule {
        collection,
        path,
        coercion,
    }
}

pub static COERCIONS: &[CoercionRule] = &[
    rule("ships", &["range"], Coercion::IntegerToString),
    rule("upgrades", &["range"], Coercion::IntegerToString),
    rule("ships", &["attack"], Coercion::StringToInteger),
    rule("upgrades", &["attack"], Coercion::StringToInteger),
    rule("pilots", &["ship_override", "attack"], Coercion::StringToInteger),
    rule("ships", &["energy"], Coercion::StringToInteger),
    rule("upgrades", &["energy"], Coercion::StringToInteger),
];

/// Apply one coercion to a record. Returns whether the value changed.
pub fn coerce_field(record: &mut Record, rule: &CoercionRule) -> Result<bool> {
    let label = record_label(record);
    let Some(value) = get_path_mut(record, rule.path) else {
        return Ok(false);
    };

    let replacement = match (rule.coercion, &*value) {
        (Coercion::IntegerToString, Value::Number(n)) if n.is_i64() || n.is_u64() => {
            Value::String(n.to_string())
        }
        (Coercion::StringToInteger, Value::String(s)) => {
            let parsed: i64 = s.trim().parse().map_err(|_| DataError::Validation {
                field: format!("{}.{} of {}", rule.collection, path_label(rule.path), label),
                value: s.clone(),
            })?;
            Value::from(parsed)
        }
        _ => return Ok(false),
    };

    *value = replacement;
    Ok(true)
}

/// Values seen for a field, split by JSON type
#[derive(Debug, Default)]
pub struct ValueTally {
    pub strings: BTreeSet<String>,
    pub integers: BTreeSet<i64>,
    pub other: BTreeSet<String>,
}

impl ValueTally {
    pub fn observe(&mut self, value: Option<&Value>) {
        match value {
            Some(Value::String(s)) => {
                self.strings.insert(s.clone());
            }
            Some(Value::Number(n)) if n.is_i64() => {
                self.integers.extend(n.as_i64());
            }
            Some(other) => {
                self.other.insert(other.to_string());
            }
            None => {
                self.other.insert("None".to_string());
            }
        }
    }
}

pub struct CoercePass {
    rules: Vec<&'static CoercionRule>,
}

impl CoercePass {
    pub fn new(rules: Vec<&'static CoercionRule>) -> Self {
        Self { rules }
    }

    pub fn standard() -> Self {
        Self::new(COERCIONS.iter().collect())
    }
}

impl Pass for CoercePass {
    fn name(&self) -> &'static str {
        "coerce"
    }

    fn targets(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.rules.iter().map(|r| r.collection).collect();
        names.into_iter().map(String::from).collect()
    }

    fn lookups(&self) -> Vec<String> {
        Vec::new()
    }

    fn analyze(&self, data: &Dataset, ui: &mut dyn Ui) -> Result<()> {
        let mut tallies: BTreeMap<String, ValueTally> = BTreeMap::new();
        for rule in &self.rules {
            let field = rule.path.last().copied().unwrap_or_default();
            let tally = tallies.entry(field.to_string()).or_default();
            for record in &data.get(rule.collection)?.records {
                tally.observe(get_path(record, rule.path));
            }
        }

        for (field, tally) in tallies {
            ui.log(&field);
            ui.log(&format!("  strings: {:?}", tally.strings));
            ui.log(&format!("  integers: {:?}", tally.integers));
            ui.log(&format!("  other: {:?}", tally.other));
        }
        Ok(())
    }

    fn normalize(&mut self, data: &mut Dataset, _ui: &mut dyn Ui) -> Result<()> {
        for rule in &self.rules {
            for record in data.get_mut(rule.collection)?.records.iter_mut() {
                coerce_field(record, rule)?;
            }
        }
        Ok(())
    }
}
