use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::APP_NAME;

/// Last successfully fetched reserved ids, one file per collection
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(custom_dir: Option<PathBuf>) -> Result<Self> {
        let cache_dir = match custom_dir {
            Some(dir) => dir,
            None => {
                let proj_dirs = ProjectDirs::from("", "", APP_NAME)
                    .context("Could not determine cache directory")?;
                proj_dirs.cache_dir().to_path_buf()
            }
        };

        fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;

        Ok(Self { cache_dir })
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn ids_path(&self, collection: &str) -> PathBuf {
        self.cache_dir.join(format!("{}-ids.json", collection))
    }

    pub fn is_cached(&self, collection: &str) -> bool {
        self.ids_path(collection).exists()
    }

    pub fn store(&self, collection: &str, ids: &BTreeMap<String, i64>) -> Result<()> {
        let path = self.ids_path(collection);
        let text = serde_json::to_string_pretty(ids)?;
        fs::write(&path, text).with_context(|| format!("Failed to write {:?}", path))
    }

    pub fn load(&self, collection: &str) -> Result<BTreeMap<String, i64>> {
        let path = self.ids_path(collection);
        let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {:?}", path))
    }
}
