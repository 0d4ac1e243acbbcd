//! Field renames that keep the key's position in the record

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::warn;

use super::{Dataset, Pass};
use crate::error::Result;
use crate::store::{record_label, Record};
use crate::ui::Ui;

#[derive(Debug, Clone, Copy)]
pub struct RenameRule {
    pub collection: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

pub static RENAMES: &[RenameRule] = &[
    RenameRule {
        collection: "ships",
        from: "faction",
        to: "factions",
    },
    RenameRule {
        collection: "upgrades",
        from: "size",
        to: "sizes",
    },
    RenameRule {
        collection: "upgrades",
        from: "ship",
        to: "ships",
    },
];

/// Rename `from` to `to` in place. Returns false when nothing changed:
/// `from` is absent, or `to` already exists and the record is left alone.
pub fn rename_field(record: &mut Record, from: &str, to: &str) -> bool {
    if !record.contains_key(from) {
        return false;
    }
    if record.contains_key(to) {
        warn!(record = %record_label(record), from, to, "target field already present, not renaming");
        return false;
    }

    let renamed: Map<String, Value> = std::mem::take(record)
        .into_iter()
        .map(|(key, value)| if key == from { (to.to_string(), value) } else { (key, value) })
        .collect();
    *record = renamed;
    true
}

pub struct RenamePass {
    rules: Vec<&'static RenameRule>,
}

impl RenamePass {
    pub fn new(rules: Vec<&'static RenameRule>) -> Self {
        Self { rules }
    }

    pub fn standard() -> Self {
        Self::new(RENAMES.iter().collect())
    }
}

impl Pass for RenamePass {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn targets(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.rules.iter().map(|r| r.collection).collect();
        names.into_iter().map(String::from).collect()
    }

    fn lookups(&self) -> Vec<String> {
        Vec::new()
    }

    fn analyze(&self, data: &Dataset, ui: &mut dyn Ui) -> Result<()> {
        for rule in &self.rules {
            let records = &data.get(rule.collection)?.records;
            let count = |field: &str| records.iter().filter(|r| r.contains_key(field)).count();
            ui.log(&format!(
                "{}: {} records with {}, {} with {}",
                rule.collection,
                count(rule.from),
                rule.from,
                count(rule.to),
                rule.to
            ));
        }
        Ok(())
    }

    fn normalize(&mut self, data: &mut Dataset, _ui: &mut dyn Ui) -> Result<()> {
        for rule in &self.rules {
            for record in data.get_mut(rule.collection)?.records.iter_mut() {
                rename_field(record, rule.from, rule.to);
            }
        }
        Ok(())
    }
}
