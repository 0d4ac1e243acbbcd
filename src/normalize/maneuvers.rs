//! Maneuver table normalization
//!
//! Every ship of a given size ends up with a rectangular `maneuvers` table:
//! rows cut or zero-padded to a fixed number of directions, and at least a
//! minimum number of speed rows. Huge ships get the same treatment for
//! `maneuvers_energy`, shaped after their `maneuvers` rows.

use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

use super::{Dataset, Pass};
use crate::config::{ManeuverConfig, MissingTable, TableShape};
use crate::error::{DataError, Result};
use crate::store::{record_label, Record};
use crate::ui::Ui;

const MANEUVERS: &str = "maneuvers";
const MANEUVERS_ENERGY: &str = "maneuvers_energy";

/// Table shape applied to ships of one size
#[derive(Debug, Clone)]
pub struct ManeuverPolicy {
    pub size: String,
    pub shape: TableShape,
    /// Also shape `maneuvers_energy`
    pub energy: bool,
}

impl ManeuverPolicy {
    pub fn new(size: impl Into<String>, shape: TableShape) -> Self {
        Self {
            size: size.into(),
            shape,
            energy: false,
        }
    }

    pub fn with_energy(self) -> Self {
        Self { energy: true, ..self }
    }

    pub fn matches(&self, ship: &Record) -> bool {
        ship.get("size").and_then(Value::as_str) == Some(self.size.as_str())
    }

    /// Policies for huge, large and small ships, in that order
    pub fn standard(config: &ManeuverConfig) -> Vec<Self> {
        vec![
            Self::new("huge", config.huge).with_energy(),
            Self::new("large", config.large),
            Self::new("small", config.small),
        ]
    }
}

/// Shape the tables of one ship. Ships the policy does not match are left alone.
pub fn normalize_ship(ship: &mut Record, policy: &ManeuverPolicy) -> Result<()> {
    if !policy.matches(ship) {
        return Ok(());
    }

    let label = record_label(ship);
    let shape = policy.shape;

    let mut table = take_table(ship, MANEUVERS, &label)?;
    let missing = table.is_empty();
    for row in table.iter_mut() {
        row.resize(shape.directions, Value::from(0));
    }
    if !missing || shape.missing == MissingTable::ZeroFilled {
        pad_rows(&mut table, shape.min_rows, |_| shape.directions);
    }

    if policy.energy {
        let mut energy = take_table(ship, MANEUVERS_ENERGY, &label)?;
        for (index, row) in energy.iter_mut().enumerate() {
            let width = table.get(index).map_or(shape.directions, Vec::len);
            row.resize(width, Value::from(0));
        }
        let widths: Vec<usize> = table.iter().map(Vec::len).collect();
        pad_rows(&mut energy, table.len(), |index| {
            widths.get(index).copied().unwrap_or(shape.directions)
        });
        ship.insert(MANEUVERS_ENERGY.to_string(), to_value(energy));
    }

    debug!(ship = %label, rows = table.len(), "shaped maneuver table");
    ship.insert(MANEUVERS.to_string(), to_value(table));
    Ok(())
}

fn take_table(ship: &Record, field: &str, label: &str) -> Result<Vec<Vec<Value>>> {
    let invalid = |message: String| DataError::InvalidShape {
        collection: "ships".to_string(),
        message: format!("{} of {}: {}", field, label, message),
    };

    match ship.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(rows)) => rows
            .iter()
            .enumerate()
            .map(|(index, row)| match row {
                Value::Array(cells) => Ok(cells.clone()),
                other => Err(invalid(format!("row {} is not an array: {}", index, other))),
            })
            .collect(),
        Some(other) => Err(invalid(format!("not an array: {}", other))),
    }
}

fn pad_rows(table: &mut Vec<Vec<Value>>, min_rows: usize, width: impl Fn(usize) -> usize) {
    while table.len() < min_rows {
        let index = table.len();
        table.push(vec![Value::from(0); width(index)]);
    }
}

fn to_value(table: Vec<Vec<Value>>) -> Value {
    Value::Array(table.into_iter().map(Value::Array).collect())
}

/// Row count and width statistics for the ships a policy matches
#[derive(Debug, Default, PartialEq)]
pub struct TableStats {
    pub ships: usize,
    pub without_table: Vec<String>,
    pub min_rows: Option<usize>,
    pub max_rows: Option<usize>,
    /// Rows up to the last one holding a non-zero value
    pub max_effective_rows: Option<usize>,
    pub min_width: Option<usize>,
    pub max_width: Option<usize>,
    pub values: BTreeSet<i64>,
}

impl TableStats {
    pub fn collect<'a>(ships: impl Iterator<Item = &'a Record>, policy: &ManeuverPolicy) -> Self {
        let mut stats = Self::default();
        for ship in ships.filter(|s| policy.matches(s)) {
            stats.ships += 1;
            let Some(Value::Array(rows)) = ship.get(MANEUVERS) else {
                stats.without_table.push(record_label(ship));
                continue;
            };

            let effective = rows
                .iter()
                .rposition(|row| row.as_array().is_some_and(|cells| cells.iter().any(is_nonzero)))
                .map_or(0, |last| last + 1);
            stats.max_effective_rows = stats.max_effective_rows.max(Some(effective));
            stats.max_rows = stats.max_rows.max(Some(rows.len()));
            stats.min_rows = Some(stats.min_rows.map_or(rows.len(), |m| m.min(rows.len())));

            for cells in rows.iter().filter_map(Value::as_array) {
                stats.max_width = stats.max_width.max(Some(cells.len()));
                stats.min_width = Some(stats.min_width.map_or(cells.len(), |m| m.min(cells.len())));
                stats.values.extend(cells.iter().filter_map(Value::as_i64));
            }
        }
        stats
    }
}

fn is_nonzero(value: &Value) -> bool {
    value.as_i64().map_or(!value.is_null(), |v| v != 0)
}

/// Shapes the maneuver tables of every ship size
pub struct ManeuversPass {
    policies: Vec<ManeuverPolicy>,
}

impl ManeuversPass {
    pub fn new(policies: Vec<ManeuverPolicy>) -> Self {
        Self { policies }
    }
}

impl Pass for ManeuversPass {
    fn name(&self) -> &'static str {
        "maneuvers"
    }

    fn targets(&self) -> Vec<String> {
        vec!["ships".to_string()]
    }

    fn lookups(&self) -> Vec<String> {
        Vec::new()
    }

    fn analyze(&self, data: &Dataset, ui: &mut dyn Ui) -> Result<()> {
        let ships = data.get("ships")?;
        let show = |n: Option<usize>| n.map_or("-".to_string(), |n| n.to_string());

        for policy in &self.policies {
            let stats = TableStats::collect(ships.records.iter(), policy);
            ui.log(&format!("{} ships: {}", policy.size, stats.ships));
            for name in &stats.without_table {
                ui.log(&format!("  no maneuvers: {}", name));
            }
            ui.log(&format!("  Max Speed {}", show(stats.max_rows)));
            ui.log(&format!("  Filtered Max Speed {}", show(stats.max_effective_rows)));
            ui.log(&format!("  Min Speed {}", show(stats.min_rows)));
            ui.log(&format!("  Max Maneuvers {}", show(stats.max_width)));
            ui.log(&format!("  Min Maneuvers {}", show(stats.min_width)));
            ui.log(&format!("  Types {:?}", stats.values));
        }
        Ok(())
    }

    fn normalize(&mut self, data: &mut Dataset, _ui: &mut dyn Ui) -> Result<()> {
        let ships = data.get_mut("ships")?;
        for policy in &self.policies {
            for ship in ships.records.iter_mut() {
                normalize_ship(ship, policy)?;
            }
        }
        Ok(())
    }
}
