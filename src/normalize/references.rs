//! Cross-collection reference resolution
//!
//! References between collections are written by hand in several loose
//! forms: a bare name, a partial object carrying an id, or a `name -> amount`
//! map. Resolution rewrites each one into `{<id_field>, name}` (or
//! `{<id_field>, amount, name}` for source contents) pointing at a real
//! record of the target collection.

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

use super::{Dataset, Pass};
use crate::error::{DataError, Result};
use crate::store::{
    get_path, get_path_mut, path_label, record_id, record_label, record_name, set_path, Collection,
    Record,
};
use crate::ui::Ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `{<id_field>, name}`
    Simple,
    /// `{<id_field>, amount, name}`
    Contents,
}

/// Fixed amount for a contents reference that carries none
#[derive(Debug, Clone, Copy)]
pub struct AmountOverride {
    pub record_id: i64,
    pub name: &'static str,
    pub amount: i64,
}

const fn amount(record_id: i64, name: &'static str, amount: i64) -> AmountOverride {
    AmountOverride {
        record_id,
        name,
        amount,
    }
}

/// One reference field: where it lives and what it points at
#[derive(Debug, Clone, Copy)]
pub struct ReferenceSpec {
    pub source: &'static str,
    pub path: &'static [&'static str],
    pub target: &'static str,
    pub id_field: &'static str,
    pub kind: ReferenceKind,
    pub amounts: &'static [AmountOverride],
}

impl ReferenceSpec {
    pub fn field(&self) -> String {
        format!("{}.{}", self.source, path_label(self.path))
    }

    fn amount_override(&self, record_id: Option<i64>, name: &str) -> Option<i64> {
        let record_id = record_id?;
        self.amounts
            .iter()
            .find(|a| a.record_id == record_id && a.name == name)
            .map(|a| a.amount)
    }
}

/// Ship counts of the early products, whose contents listed ship names only
pub const SOURCE_SHIP_AMOUNTS: &[AmountOverride] = &[
    amount(0, "TIE Fighter", 2),
    amount(0, "X-Wing", 1),
    amount(1, "X-Wing", 1),
    amount(2, "Y-Wing", 1),
    amount(3, "TIE Fighter", 1),
    amount(4, "TIE Advanced", 1),
    amount(5, "TIE Interceptor", 1),
    amount(6, "A-Wing", 1),
    amount(7, "YT-1300", 1),
    amount(8, "Firespray-31", 1),
    amount(9, "B-Wing", 1),
    amount(10, "HWK-290", 1),
    amount(11, "TIE Bomber", 1),
    amount(12, "Lambda-Class Shuttle", 1),
    amount(13, "TIE Interceptor", 2),
    amount(14, "Z-95 Headhunter", 1),
    amount(15, "TIE Defender", 1),
    amount(16, "E-Wing", 1),
    amount(17, "TIE Phantom", 1),
    amount(18, "A-Wing", 1),
    amount(18, "B-Wing", 1),
    amount(19, "CR90 Corvette (Aft)", 1),
    amount(19, "CR90 Corvette (Fore)", 1),
    amount(20, "GR-75 Medium Transport", 1),
    amount(20, "X-Wing", 1),
    amount(21, "YT-2400", 1),
    amount(22, "VT-49 Decimator", 1),
    amount(23, "Y-Wing", 1),
    amount(23, "Z-95 Headhunter", 2),
    amount(24, "StarViper", 1),
    amount(25, "M3-A Interceptor", 1),
    amount(26, "Aggressor", 1),
    amount(27, "Raider-class Corvette (Aft)", 1),
    amount(27, "Raider-class Corvette (Fore)", 1),
    amount(27, "TIE Advanced", 1),
    amount(28, "YV-666", 1),
    amount(29, "Kihraxz Fighter", 1),
    amount(30, "K-Wing", 1),
    amount(31, "TIE Punisher", 1),
    amount(32, "T-70 X-Wing", 1),
    amount(32, "TIE/fo Fighter", 2),
    amount(33, "T-70 X-Wing", 1),
    amount(34, "TIE/fo Fighter", 1),
    amount(35, "JumpMaster 5000", 1),
    amount(36, "G-1A Starfighter", 1),
    amount(37, "TIE Adv. Prototype", 1),
    amount(38, "Attack Shuttle", 1),
    amount(38, "VCX-100", 1),
    amount(39, "Gozanti-Class Cruiser", 1),
    amount(39, "TIE Fighter", 2),
    amount(40, "TIE Bomber", 1),
    amount(40, "TIE Defender", 1),
    amount(41, "T-70 X-Wing", 1),
    amount(41, "YT-1300", 1),
    amount(42, "ARC-170", 1),
    amount(43, "TIE/sf Fighter", 1),
    amount(44, "Protectorate Starfighter", 1),
    amount(45, "Lancer-class Pursuit Craft", 1),
    amount(46, "TIE Fighter", 1),
    amount(47, "Upsilon-class Shuttle", 1),
    amount(48, "Quadjumper", 1),
    amount(49, "U-Wing", 1),
    amount(50, "TIE Striker", 1),
];

/// Every reference field of the dataset, in resolution order
pub static REFERENCES: &[ReferenceSpec] = &[
    ReferenceSpec {
        source: "sources",
        path: &["contents", "ships"],
        target: "ships",
        id_field: "ship_id",
        kind: ReferenceKind::Contents,
        amounts: SOURCE_SHIP_AMOUNTS,
    },
    ReferenceSpec {
        source: "sources",
        path: &["contents", "upgrades"],
        target: "upgrades",
        id_field: "upgrade_id",
        kind: ReferenceKind::Contents,
        amounts: &[],
    },
    ReferenceSpec {
        source: "sources",
        path: &["contents", "conditions"],
        target: "conditions",
        id_field: "condition_id",
        kind: ReferenceKind::Contents,
        amounts: &[],
    },
    ReferenceSpec {
        source: "sources",
        path: &["contents", "pilots"],
        target: "pilots",
        id_field: "pilot_id",
        kind: ReferenceKind::Contents,
        amounts: &[],
    },
    ReferenceSpec {
        source: "upgrades",
        path: &["conditions"],
        target: "conditions",
        id_field: "condition_id",
        kind: ReferenceKind::Simple,
        amounts: &[],
    },
    ReferenceSpec {
        source: "upgrades",
        path: &["ship"],
        target: "ships",
        id_field: "ship_id",
        kind: ReferenceKind::Simple,
        amounts: &[],
    },
    ReferenceSpec {
        source: "upgrades",
        path: &["ships"],
        target: "ships",
        id_field: "ship_id",
        kind: ReferenceKind::Simple,
        amounts: &[],
    },
    ReferenceSpec {
        source: "pilots",
        path: &["conditions"],
        target: "conditions",
        id_field: "condition_id",
        kind: ReferenceKind::Simple,
        amounts: &[],
    },
    ReferenceSpec {
        source: "pilots",
        path: &["ship"],
        target: "ships",
        id_field: "ship_id",
        kind: ReferenceKind::Simple,
        amounts: &[],
    },
];

/// Resolves one reference field against its target collection
pub struct Resolver<'a> {
    spec: &'a ReferenceSpec,
    target: &'a Collection,
}

impl<'a> Resolver<'a> {
    pub fn new(spec: &'a ReferenceSpec, target: &'a Collection) -> Self {
        Self { spec, target }
    }

    pub fn is_normalized(&self, value: &Value) -> bool {
        let Value::Object(map) = value else {
            return false;
        };
        map.contains_key(self.spec.id_field)
            && map.contains_key("name")
            && (self.spec.kind == ReferenceKind::Simple || map.contains_key("amount"))
    }

    /// Resolve one reference value found in `context`
    pub fn resolve(&self, value: &Value, context: &Record) -> Result<Value> {
        if self.is_normalized(value) {
            return Ok(value.clone());
        }

        let target = match value {
            Value::Object(map) if map.contains_key(self.spec.id_field) => {
                let id = map.get(self.spec.id_field).and_then(Value::as_i64);
                id.and_then(|id| self.target.find_by_id(id))
                    .ok_or_else(|| self.dangling(value))?
            }
            Value::String(name) => self
                .target
                .find_by_name(name)
                .ok_or_else(|| self.dangling(value))?,
            _ => {
                return Err(DataError::UnrecognizedReference {
                    field: self.spec.field(),
                    value: value.to_string(),
                })
            }
        };

        let amount = match self.spec.kind {
            ReferenceKind::Simple => None,
            ReferenceKind::Contents => Some(match value.get("amount") {
                Some(amount) => amount.clone(),
                None => self.override_amount(value, target, context)?,
            }),
        };
        self.build(target, amount)
    }

    /// Resolve a `(key, amount)` entry of a `name -> amount` map. All-digit
    /// keys are ids, anything else a name.
    pub fn resolve_entry(&self, key: &str, amount: &Value) -> Result<Value> {
        let target = if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            key.parse::<i64>()
                .ok()
                .and_then(|id| self.target.find_by_id(id))
        } else {
            self.target.find_by_name(key)
        };

        let target = target.ok_or_else(|| self.dangling(&Value::String(key.to_string())))?;
        self.build(target, Some(amount.clone()))
    }

    /// Resolve the field in place. Returns false when the record lacks it.
    pub fn resolve_field(&self, record: &mut Record) -> Result<bool> {
        let Some(current) = get_path(record, self.spec.path) else {
            return Ok(false);
        };

        let resolved = match current {
            Value::Null => return Ok(false),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve(item, record))
                    .collect::<Result<_>>()?,
            ),
            Value::Object(entries)
                if self.spec.kind == ReferenceKind::Contents && !self.is_normalized(current) =>
            {
                Value::Array(
                    entries
                        .iter()
                        .map(|(key, amount)| self.resolve_entry(key, amount))
                        .collect::<Result<_>>()?,
                )
            }
            single => self.resolve(single, record)?,
        };

        debug!(field = %self.spec.field(), record = %record_label(record), "resolved reference");
        set_path(record, self.spec.path, resolved);
        Ok(true)
    }

    /// Point a normalized reference at the first target record carrying its
    /// name, keeping every other key. Returns whether the id changed.
    pub fn refresh(&self, value: &mut Value) -> Result<bool> {
        let id = {
            let current: &Value = value;
            if !self.is_normalized(current) {
                return Err(DataError::UnrecognizedReference {
                    field: self.spec.field(),
                    value: current.to_string(),
                });
            }
            let target = current
                .get("name")
                .and_then(Value::as_str)
                .and_then(|name| self.target.find_by_name(name))
                .ok_or_else(|| self.dangling(current))?;
            self.target_id(target)?
        };

        let Value::Object(map) = value else {
            return Ok(false);
        };
        if map.get(self.spec.id_field) == Some(&id) {
            return Ok(false);
        }
        map.insert(self.spec.id_field.to_string(), id);
        Ok(true)
    }

    /// Refresh the ids of the field in place, returning how many changed
    pub fn refresh_field(&self, record: &mut Record) -> Result<usize> {
        let label = record_label(record);
        let Some(current) = get_path_mut(record, self.spec.path) else {
            return Ok(0);
        };

        let mut changed = 0;
        match current {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter_mut() {
                    if self.refresh(item)? {
                        changed += 1;
                    }
                }
            }
            single => {
                if self.refresh(single)? {
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            debug!(field = %self.spec.field(), record = %label, changed, "refreshed reference ids");
        }
        Ok(changed)
    }

    fn override_amount(&self, value: &Value, target: &Record, context: &Record) -> Result<Value> {
        let name = record_name(target).unwrap_or_default();
        self.spec
            .amount_override(record_id(context), name)
            .map(Value::from)
            .ok_or_else(|| DataError::MissingAmount {
                field: self.spec.field(),
                value: value.to_string(),
                record_id: record_label(context),
            })
    }

    fn target_id(&self, target: &Record) -> Result<Value> {
        target.get("id").cloned().ok_or_else(|| DataError::InvalidShape {
            collection: self.spec.target.to_string(),
            message: format!("{} has no id", record_label(target)),
        })
    }

    fn build(&self, target: &Record, amount: Option<Value>) -> Result<Value> {
        let id = self.target_id(target)?;

        let mut reference = Map::new();
        reference.insert(self.spec.id_field.to_string(), id);
        if let Some(amount) = amount {
            reference.insert("amount".to_string(), amount);
        }
        reference.insert(
            "name".to_string(),
            target.get("name").cloned().unwrap_or(Value::Null),
        );
        Ok(Value::Object(reference))
    }

    fn dangling(&self, value: &Value) -> DataError {
        DataError::DanglingReference {
            field: self.spec.field(),
            target: self.spec.target.to_string(),
            value: value.to_string(),
        }
    }
}

/// Resolve every record's field for one spec
pub fn resolve_collection(spec: &ReferenceSpec, data: &mut Dataset) -> Result<usize> {
    let target = data.get(spec.target)?.clone();
    let resolver = Resolver::new(spec, &target);

    let mut resolved = 0;
    for record in data.get_mut(spec.source)?.records.iter_mut() {
        if resolver.resolve_field(record)? {
            resolved += 1;
        }
    }
    Ok(resolved)
}

fn sources_of(specs: &[&ReferenceSpec]) -> Vec<String> {
    let names: BTreeSet<&str> = specs.iter().map(|s| s.source).collect();
    names.into_iter().map(String::from).collect()
}

fn targets_of(specs: &[&ReferenceSpec]) -> Vec<String> {
    let names: BTreeSet<&str> = specs.iter().map(|s| s.target).collect();
    names.into_iter().map(String::from).collect()
}

/// Resolves a list of reference fields
pub struct ReferencesPass {
    specs: Vec<&'static ReferenceSpec>,
}

impl ReferencesPass {
    pub fn new(specs: Vec<&'static ReferenceSpec>) -> Self {
        Self { specs }
    }

    pub fn standard() -> Self {
        Self::new(REFERENCES.iter().collect())
    }
}

impl Pass for ReferencesPass {
    fn name(&self) -> &'static str {
        "references"
    }

    fn targets(&self) -> Vec<String> {
        sources_of(&self.specs)
    }

    fn lookups(&self) -> Vec<String> {
        targets_of(&self.specs)
    }

    fn analyze(&self, data: &Dataset, ui: &mut dyn Ui) -> Result<()> {
        let targets: BTreeSet<&str> = self.specs.iter().map(|s| s.target).collect();
        for name in targets {
            let target = data.get(name)?;
            let without_id: Vec<String> = target
                .records
                .iter()
                .filter(|r| record_id(r).is_none())
                .map(record_label)
                .collect();

            ui.log(&format!("Models in {}: {}", name, target.len()));
            ui.log(&format!(
                "Max id in {}: {}",
                name,
                target.max_id().map_or("None".to_string(), |id| id.to_string())
            ));
            ui.log(&format!("Models with no id in {}: {:?}", name, without_id));
        }
        Ok(())
    }

    fn normalize(&mut self, data: &mut Dataset, ui: &mut dyn Ui) -> Result<()> {
        for spec in &self.specs {
            let resolved = resolve_collection(spec, data)?;
            ui.log(&format!("{}: {} records resolved", spec.field(), resolved));
        }
        Ok(())
    }
}

/// Re-point already resolved references by name, after target records were
/// renumbered by hand
pub struct RefreshIdsPass {
    specs: Vec<&'static ReferenceSpec>,
}

impl RefreshIdsPass {
    pub fn new(specs: Vec<&'static ReferenceSpec>) -> Self {
        Self { specs }
    }

    pub fn standard() -> Self {
        Self::new(REFERENCES.iter().collect())
    }
}

impl Pass for RefreshIdsPass {
    fn name(&self) -> &'static str {
        "refresh-ids"
    }

    fn targets(&self) -> Vec<String> {
        sources_of(&self.specs)
    }

    fn lookups(&self) -> Vec<String> {
        targets_of(&self.specs)
    }

    fn analyze(&self, _data: &Dataset, ui: &mut dyn Ui) -> Result<()> {
        ui.log("Nothing to show");
        Ok(())
    }

    fn normalize(&mut self, data: &mut Dataset, ui: &mut dyn Ui) -> Result<()> {
        for spec in &self.specs {
            let target = data.get(spec.target)?.clone();
            let resolver = Resolver::new(spec, &target);

            let mut changed = 0;
            for record in data.get_mut(spec.source)?.records.iter_mut() {
                changed += resolver.refresh_field(record)?;
            }
            ui.log(&format!("{}: {} ids refreshed", spec.field(), changed));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(name: &str, value: Value) -> Collection {
        Collection::from_value(name, value).unwrap()
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn spec(source: &str, path: &[&str]) -> &'static ReferenceSpec {
        REFERENCES
            .iter()
            .find(|s| s.source == source && s.path == path)
            .unwrap()
    }

    fn pilots() -> Collection {
        collection(
            "pilots",
            json!([
                {"name": "Luke Skywalker", "id": 1},
                {"name": "Biggs Darklighter", "id": 2},
                {"name": "Darth Vader", "id": 3},
                {"name": "Darth Vader", "id": 9}
            ]),
        )
    }

    #[test]
    fn test_name_resolves_to_first_match() {
        let pilots = pilots();
        let resolver = Resolver::new(spec("sources", &["contents", "pilots"]), &pilots);
        let resolved = resolver.resolve_entry("Darth Vader", &json!(1)).unwrap();
        assert_eq!(resolved, json!({"pilot_id": 3, "amount": 1, "name": "Darth Vader"}));
        assert_eq!(
            serde_json::to_string(&resolved).unwrap(),
            r#"{"pilot_id":3,"amount":1,"name":"Darth Vader"}"#
        );
    }

    #[test]
    fn test_simple_name_reference() {
        let ships = collection("ships", json!([{"name": "TIE Advanced", "id": 5}]));
        let resolver = Resolver::new(spec("pilots", &["ship"]), &ships);

        let resolved = resolver.resolve(&json!("TIE Advanced"), &Record::new()).unwrap();
        assert_eq!(resolved, json!({"ship_id": 5, "name": "TIE Advanced"}));
        assert_eq!(
            serde_json::to_string(&resolved).unwrap(),
            r#"{"ship_id":5,"name":"TIE Advanced"}"#
        );
    }

    #[test]
    fn test_normalized_reference_is_unchanged() {
        let pilots = pilots();
        let resolver = Resolver::new(spec("sources", &["contents", "pilots"]), &pilots);
        let value = json!({"pilot_id": 42, "amount": 1, "name": "Somebody Else"});

        assert_eq!(resolver.resolve(&value, &Record::new()).unwrap(), value);
    }

    #[test]
    fn test_id_object_is_completed() {
        let pilots = pilots();
        let resolver = Resolver::new(spec("sources", &["contents", "pilots"]), &pilots);

        let resolved = resolver
            .resolve(&json!({"pilot_id": 2, "amount": 1}), &Record::new())
            .unwrap();
        assert_eq!(resolved, json!({"pilot_id": 2, "amount": 1, "name": "Biggs Darklighter"}));
    }

    #[test]
    fn test_digit_keys_are_ids() {
        let pilots = pilots();
        let resolver = Resolver::new(spec("sources", &["contents", "pilots"]), &pilots);
        let mut source = record(json!({"id": 0, "contents": {"pilots": {"1": 2, "Darth Vader": 1}}}));

        assert!(resolver.resolve_field(&mut source).unwrap());
        assert_eq!(
            source["contents"]["pilots"],
            json!([
                {"pilot_id": 1, "amount": 2, "name": "Luke Skywalker"},
                {"pilot_id": 3, "amount": 1, "name": "Darth Vader"}
            ])
        );
    }

    #[test]
    fn test_dangling_and_unrecognized() {
        let pilots = pilots();
        let resolver = Resolver::new(spec("pilots", &["conditions"]), &pilots);

        let err = resolver.resolve(&json!("Unknown Pilot"), &Record::new()).unwrap_err();
        assert!(matches!(err, DataError::DanglingReference { .. }));

        let err = resolver.resolve(&json!(17), &Record::new()).unwrap_err();
        assert!(matches!(err, DataError::UnrecognizedReference { .. }));
    }

    #[test]
    fn test_ship_amount_overrides() {
        let ships = collection(
            "ships",
            json!([{"name": "X-Wing", "id": 1}, {"name": "TIE Fighter", "id": 2}]),
        );
        let resolver = Resolver::new(spec("sources", &["contents", "ships"]), &ships);

        let mut core = record(json!({"id": 0, "contents": {"ships": ["X-Wing", "TIE Fighter"]}}));
        resolver.resolve_field(&mut core).unwrap();
        assert_eq!(
            core["contents"]["ships"],
            json!([
                {"ship_id": 1, "amount": 1, "name": "X-Wing"},
                {"ship_id": 2, "amount": 2, "name": "TIE Fighter"}
            ])
        );

        let mut unknown = record(json!({"id": 99, "contents": {"ships": ["X-Wing"]}}));
        let err = resolver.resolve_field(&mut unknown).unwrap_err();
        assert!(matches!(err, DataError::MissingAmount { .. }));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let ships = collection("ships", json!([{"name": "X-Wing", "id": 1}]));
        let resolver = Resolver::new(spec("upgrades", &["ships"]), &ships);
        let mut upgrade = record(json!({"name": "Integrated Astromech", "ships": ["X-Wing"]}));

        resolver.resolve_field(&mut upgrade).unwrap();
        let once = upgrade.clone();
        resolver.resolve_field(&mut upgrade).unwrap();

        assert_eq!(upgrade, once);
    }

    #[test]
    fn test_refresh_follows_names() {
        let pilots = pilots();
        let resolver = Resolver::new(spec("sources", &["contents", "pilots"]), &pilots);
        let mut source = record(json!({"id": 0, "contents": {"pilots": [
            {"pilot_id": 2, "amount": 1, "name": "Luke Skywalker"},
            {"pilot_id": 9, "amount": 2, "name": "Darth Vader"},
            {"pilot_id": 2, "amount": 1, "name": "Biggs Darklighter"}
        ]}}));

        assert_eq!(resolver.refresh_field(&mut source).unwrap(), 2);
        assert_eq!(
            source["contents"]["pilots"],
            json!([
                {"pilot_id": 1, "amount": 1, "name": "Luke Skywalker"},
                {"pilot_id": 3, "amount": 2, "name": "Darth Vader"},
                {"pilot_id": 2, "amount": 1, "name": "Biggs Darklighter"}
            ])
        );
        assert_eq!(
            serde_json::to_string(&source["contents"]["pilots"][0]).unwrap(),
            r#"{"pilot_id":1,"amount":1,"name":"Luke Skywalker"}"#
        );
    }

    #[test]
    fn test_refresh_single_reference_and_errors() {
        let ships = collection("ships", json!([{"name": "X-Wing", "id": 4}]));
        let resolver = Resolver::new(spec("pilots", &["ship"]), &ships);

        let mut pilot = record(json!({"name": "Wedge Antilles", "ship": {"ship_id": 1, "name": "X-Wing"}}));
        assert_eq!(resolver.refresh_field(&mut pilot).unwrap(), 1);
        assert_eq!(pilot["ship"], json!({"ship_id": 4, "name": "X-Wing"}));
        assert_eq!(resolver.refresh_field(&mut pilot).unwrap(), 0);

        let mut gone = record(json!({"ship": {"ship_id": 1, "name": "B-Wing"}}));
        let err = resolver.refresh_field(&mut gone).unwrap_err();
        assert!(matches!(err, DataError::DanglingReference { .. }));

        let mut loose = record(json!({"ship": "X-Wing"}));
        let err = resolver.refresh_field(&mut loose).unwrap_err();
        assert!(matches!(err, DataError::UnrecognizedReference { .. }));
    }

    #[test]
    fn test_missing_field_is_skipped() {
        let ships = collection("ships", json!([]));
        let resolver = Resolver::new(spec("upgrades", &["ship"]), &ships);
        let mut upgrade = record(json!({"name": "Veteran Instincts"}));

        assert!(!resolver.resolve_field(&mut upgrade).unwrap());
        assert!(!upgrade.contains_key("ship"));
    }
}
