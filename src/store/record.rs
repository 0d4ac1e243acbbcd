use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::error::{DataError, Result};

/// One card as an ordered field map
pub type Record = Map<String, Value>;

/// A named, ordered sequence of records loaded from one data file
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub name: String,
    pub records: Vec<Record>,
}

impl Collection {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Build a collection from a parsed document, which must be an array of objects
    pub fn from_value(name: &str, value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(DataError::InvalidShape {
                collection: name.to_string(),
                message: "top-level value is not an array".to_string(),
            });
        };

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(record) => records.push(record),
                other => {
                    return Err(DataError::InvalidShape {
                        collection: name.to_string(),
                        message: format!("element {} is not an object: {}", index, other),
                    })
                }
            }
        }

        Ok(Self::new(name, records))
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.records.iter().cloned().map(Value::Object).collect())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find_by_id(&self, id: i64) -> Option<&Record> {
        self.records.iter().find(|r| record_id(r) == Some(id))
    }

    /// First record carrying this exact name, in collection order
    pub fn find_by_name(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|r| record_name(r) == Some(name))
    }

    pub fn max_id(&self) -> Option<i64> {
        self.records.iter().filter_map(record_id).max()
    }
}

pub fn record_id(record: &Record) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

pub fn record_name(record: &Record) -> Option<&str> {
    record.get("name").and_then(Value::as_str)
}

/// Label used in logs and error messages: the id when present, else the name
pub fn record_label(record: &Record) -> String {
    match (record_id(record), record_name(record)) {
        (Some(id), _) => id.to_string(),
        (None, Some(name)) => name.to_string(),
        (None, None) => "<unnamed>".to_string(),
    }
}

/// Follow a field path (`["contents", "ships"]`) through nested objects
pub fn get_path<'a>(record: &'a Record, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = record.get(*first)?;
    for key in rest {
        current = current.get(*key)?;
    }
    Some(current)
}

pub fn get_path_mut<'a>(record: &'a mut Record, path: &[&str]) -> Option<&'a mut Value> {
    let (first, rest) = path.split_first()?;
    let mut current = record.get_mut(*first)?;
    for key in rest {
        current = current.get_mut(*key)?;
    }
    Some(current)
}

/// Set the value at a field path, creating intermediate objects as needed.
/// Existing keys keep their position.
pub fn set_path(record: &mut Record, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = record;
    for key in parents {
        let entry = current
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }

    current.insert(last.to_string(), value);
}

pub fn path_label(path: &[&str]) -> String {
    path.join(".")
}

/// Total order over JSON values used when sorting lists and enums:
/// null < booleans < numbers < strings < arrays < objects.
/// Objects compare by their entries in key order, so two equal objects
/// always compare Equal whatever order their keys were written in.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => {
            let mut x: Vec<_> = x.iter().collect();
            let mut y: Vec<_> = y.iter().collect();
            x.sort_by(|a, b| a.0.cmp(b.0));
            y.sort_by(|a, b| a.0.cmp(b.0));
            x.iter()
                .zip(y.iter())
                .map(|((xk, xv), (yk, yv))| xk.cmp(yk).then_with(|| compare_values(xv, yv)))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| x.len().cmp(&y.len()))
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Sort and deduplicate a list of values with [`compare_values`]
pub fn sort_unique(values: &mut Vec<Value>) {
    values.sort_by(compare_values);
    values.dedup();
}
