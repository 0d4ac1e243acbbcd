//! Tool configuration
//!
//! Values come from, in order of precedence: command line flags, the file
//! given with `--config`, `config.toml` in the platform config directory,
//! and the defaults below.
//!
//! ```toml
//! data_dir = "../xwing-data/data"
//! schema_dir = "../xwing-data/schemas"
//! layout = "same-line"
//!
//! [reserved_ids]
//! ships = "https://example.org/ships-ids.json"
//!
//! [maneuvers.huge]
//! directions = 5
//! min_rows = 5
//! ```

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::Layout;

pub const APP_NAME: &str = "xwing-data-tools";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the collection files
    pub data_dir: PathBuf,
    /// Directory the schema documents are written to
    pub schema_dir: PathBuf,
    /// Extension of the collection files
    pub extension: String,
    /// Prefix for schema `id` values
    pub schema_host: String,
    /// Layout used when a pass writes its collections back
    pub layout: Layout,
    /// Collections that receive ids
    pub id_collections: Vec<String>,
    /// Collection name -> URL returning `[{"name": .., "id": ..}]`
    pub reserved_ids: BTreeMap<String, String>,
    pub maneuvers: ManeuverConfig,
    pub prompt: PromptConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            schema_dir: PathBuf::from("schemas"),
            extension: "js".to_string(),
            schema_host: String::new(),
            layout: Layout::Pretty,
            id_collections: ["ships", "pilots", "upgrades", "conditions", "sources"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            reserved_ids: BTreeMap::new(),
            maneuvers: ManeuverConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}

/// What to do with a targeted ship that has no maneuver table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingTable {
    /// Leave an empty table
    Empty,
    /// Fill with all-zero rows up to the minimum row count
    #[default]
    ZeroFilled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableShape {
    pub directions: usize,
    pub min_rows: usize,
    #[serde(default)]
    pub missing: MissingTable,
}

impl TableShape {
    pub const fn new(directions: usize, min_rows: usize) -> Self {
        Self {
            directions,
            min_rows,
            missing: MissingTable::ZeroFilled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManeuverConfig {
    pub small: TableShape,
    pub large: TableShape,
    pub huge: TableShape,
}

impl Default for ManeuverConfig {
    fn default() -> Self {
        Self {
            small: TableShape::new(13, 6),
            large: TableShape::new(13, 6),
            huge: TableShape::new(5, 5),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Rejected answers allowed per record before the pass fails
    pub max_attempts: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

impl Config {
    /// Load from an explicit file, else from the platform config dir, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

/// `config.toml` inside the platform config directory
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            data_dir = "/tmp/xwing/data"
            layout = "same-line"

            [maneuvers.huge]
            directions = 6
            min_rows = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/xwing/data"));
        assert_eq!(config.layout, Layout::SameLine);
        assert_eq!(config.extension, "js");
        assert_eq!(config.maneuvers.huge, TableShape::new(6, 4));
        assert_eq!(config.maneuvers.small, TableShape::new(13, 6));
        assert_eq!(config.prompt.max_attempts, 5);
    }

    #[test]
    fn test_missing_table_policy() {
        let shape: TableShape =
            toml::from_str("directions = 10\nmin_rows = 6\nmissing = \"empty\"").unwrap();
        assert_eq!(shape.missing, MissingTable::Empty);
    }
}
