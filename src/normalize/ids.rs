//! Id assignment for records that have none

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use super::{Dataset, Pass};
use crate::error::Result;
use crate::store::{record_id, record_label, record_name, Collection, Record};
use crate::ui::Ui;

/// The record's id when it is a non-negative integer
fn valid_id(record: &Record) -> Option<i64> {
    record_id(record).filter(|id| *id >= 0)
}

/// Give every record without a valid `id` one, returning how many were
/// assigned. A `null`, negative or non-integer id counts as missing and is
/// replaced in place.
///
/// A record adopts the reserved id for its name when that id is not already
/// in use; otherwise it gets the next id after the highest existing or
/// reserved one. Ids are 1-based. Valid ids are never touched.
pub fn assign_ids(collection: &mut Collection, reserved: &BTreeMap<String, i64>) -> usize {
    let mut taken: HashSet<i64> = collection.records.iter().filter_map(valid_id).collect();
    let mut current_max = taken
        .iter()
        .chain(reserved.values())
        .copied()
        .max()
        .unwrap_or(0)
        .max(0);

    let mut assigned = 0;
    for record in collection.records.iter_mut() {
        if valid_id(record).is_some() {
            continue;
        }

        let wanted = record_name(record).and_then(|name| reserved.get(name)).copied();
        let id = match wanted {
            Some(id) if id >= 0 && !taken.contains(&id) => id,
            Some(id) => {
                warn!(
                    collection = %collection.name,
                    record = %record_label(record),
                    id,
                    "reserved id already in use, assigning a new one"
                );
                current_max += 1;
                current_max
            }
            None => {
                current_max += 1;
                current_max
            }
        };

        debug!(collection = %collection.name, record = %record_label(record), id, "assigned id");
        record.insert("id".to_string(), Value::from(id));
        taken.insert(id);
        assigned += 1;
    }

    assigned
}

/// Adds ids to one collection
pub struct IdsPass {
    collection: String,
    reserved: BTreeMap<String, i64>,
}

impl IdsPass {
    pub fn new(collection: impl Into<String>, reserved: BTreeMap<String, i64>) -> Self {
        Self {
            collection: collection.into(),
            reserved,
        }
    }
}

impl Pass for IdsPass {
    fn name(&self) -> &'static str {
        "ids"
    }

    fn targets(&self) -> Vec<String> {
        vec![self.collection.clone()]
    }

    fn lookups(&self) -> Vec<String> {
        Vec::new()
    }

    fn analyze(&self, data: &Dataset, ui: &mut dyn Ui) -> Result<()> {
        let collection = data.get(&self.collection)?;
        let ids: Vec<i64> = collection.records.iter().filter_map(valid_id).collect();
        let without = collection.records.iter().filter(|r| valid_id(r).is_none()).count();

        let show = |id: Option<&i64>| id.map_or("None".to_string(), |id| id.to_string());
        ui.log(&format!("Collection {}", self.collection));
        ui.log(&format!("Max id {}", show(ids.iter().max())));
        ui.log(&format!("Min id {}", show(ids.iter().min())));
        ui.log(&format!("Without id {}", without));
        ui.log(&format!("Qty {}", collection.len()));
        Ok(())
    }

    fn normalize(&mut self, data: &mut Dataset, ui: &mut dyn Ui) -> Result<()> {
        let collection = data.get_mut(&self.collection)?;
        let assigned = assign_ids(collection, &self.reserved);
        ui.log(&format!("Assigned {} ids", assigned));
        Ok(())
    }
}
