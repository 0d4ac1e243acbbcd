//! Same-line layout: selected sub-values are written as single-line JSON
//! inside an otherwise pretty-printed document.
//!
//! Encoding happens in two phases. Designated values are first swapped for a
//! marker string pointing into a side table, the document is pretty printed,
//! and every quoted marker is then replaced by the single-line rendering of
//! the value it stands for. Markers carry a random per-run nonce, so they
//! cannot collide with real content.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, Write};

use super::record::{get_path_mut, Record};
use crate::error::Result;

/// On-disk rendering of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    #[default]
    Pretty,
    SameLine,
}

/// Which part of the value at a path goes on a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inline {
    /// The value itself
    Whole,
    /// Each element of the array at the path
    Elements,
}

#[derive(Debug, Clone)]
pub struct InlineRule {
    pub path: &'static [&'static str],
    pub inline: Inline,
}

impl InlineRule {
    pub const fn whole(path: &'static [&'static str]) -> Self {
        Self {
            path,
            inline: Inline::Whole,
        }
    }

    pub const fn elements(path: &'static [&'static str]) -> Self {
        Self {
            path,
            inline: Inline::Elements,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionLayout {
    pub collection: &'static str,
    pub rules: &'static [InlineRule],
}

pub static INLINE_LAYOUTS: &[CollectionLayout] = &[
    CollectionLayout {
        collection: "ships",
        rules: &[
            InlineRule::elements(&["maneuvers"]),
            InlineRule::elements(&["maneuvers_energy"]),
        ],
    },
    CollectionLayout {
        collection: "sources",
        rules: &[
            InlineRule::elements(&["contents", "ships"]),
            InlineRule::elements(&["contents", "pilots"]),
            InlineRule::elements(&["contents", "upgrades"]),
            InlineRule::elements(&["contents", "conditions"]),
        ],
    },
    CollectionLayout {
        collection: "pilots",
        rules: &[
            InlineRule::whole(&["ship"]),
            InlineRule::elements(&["conditions"]),
        ],
    },
    CollectionLayout {
        collection: "upgrades",
        rules: &[
            InlineRule::elements(&["conditions"]),
            InlineRule::elements(&["ship"]),
            InlineRule::elements(&["ships"]),
            InlineRule::elements(&["grants"]),
        ],
    },
];

/// Inline rules for a collection; empty when it has none
pub fn inline_rules(collection: &str) -> &'static [InlineRule] {
    INLINE_LAYOUTS
        .iter()
        .find(|l| l.collection == collection)
        .map(|l| l.rules)
        .unwrap_or(&[])
}

static RUN_NONCE: Lazy<String> = Lazy::new(|| format!("{:016x}", rand::random::<u64>()));

static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""@@([0-9a-f]{16}):(\d+)@@""#).expect("marker pattern is valid"));

/// Two-phase encoder for the same-line layout
pub struct SameLineEncoder {
    nonce: &'static str,
    slots: Vec<Value>,
}

impl SameLineEncoder {
    pub fn new() -> Self {
        Self {
            nonce: RUN_NONCE.as_str(),
            slots: Vec::new(),
        }
    }

    fn wrap(&mut self, value: Value) -> Value {
        let slot = self.slots.len();
        self.slots.push(value);
        Value::String(format!("@@{}:{}@@", self.nonce, slot))
    }

    fn apply(&mut self, record: &mut Record, rules: &[InlineRule]) {
        for rule in rules {
            let Some(target) = get_path_mut(record, rule.path) else {
                continue;
            };
            match rule.inline {
                Inline::Whole => {
                    let value = std::mem::take(target);
                    *target = self.wrap(value);
                }
                Inline::Elements => {
                    if let Value::Array(items) = target {
                        for item in items.iter_mut() {
                            let value = std::mem::take(item);
                            *item = self.wrap(value);
                        }
                    }
                }
            }
        }
    }

    /// Render records as a pretty JSON array with the rule targets on single lines
    pub fn encode(mut self, records: &[Record], rules: &[InlineRule]) -> Result<String> {
        let mut document = Vec::with_capacity(records.len());
        for record in records {
            let mut record = record.clone();
            self.apply(&mut record, rules);
            document.push(Value::Object(record));
        }

        let pretty = serde_json::to_string_pretty(&document)?;
        let rendered = self
            .slots
            .iter()
            .map(to_inline_string)
            .collect::<Result<Vec<_>>>()?;

        let nonce = self.nonce;
        let output = MARKER.replace_all(&pretty, |caps: &Captures| {
            let slot = caps[2].parse::<usize>().ok();
            match slot.and_then(|s| rendered.get(s)) {
                Some(inline) if &caps[1] == nonce => inline.clone(),
                _ => caps[0].to_string(),
            }
        });

        Ok(output.into_owned())
    }
}

impl Default for SameLineEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-line JSON with `", "` and `": "` separators and non-ASCII escaped,
/// matching the historical rendering of compacted values.
pub fn to_inline_string(value: &Value) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, InlineFormatter);
    value.serialize(&mut serializer)?;
    let text = String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(text)
}

struct InlineFormatter;

impl serde_json::ser::Formatter for InlineFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
