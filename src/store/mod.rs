//! Record Store: loads collections from their data files and writes them back

pub mod layout;
pub mod record;

pub use layout::*;
pub use record::*;

use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{DataError, Result};

/// Reads and writes `<root>/<collection>.<extension>` files
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
    extension: String,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.{}", collection, self.extension))
    }

    pub fn exists(&self, collection: &str) -> bool {
        self.path_for(collection).exists()
    }

    /// Load a collection, keeping the key order of every object
    pub fn load(&self, collection: &str) -> Result<Collection> {
        let path = self.path_for(collection);
        let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DataError::NotFound { path: path.clone() },
            _ => DataError::Io(e),
        })?;

        let value: Value = serde_json::from_str(&text).map_err(|source| DataError::Parse {
            path: path.clone(),
            source,
        })?;

        let loaded = Collection::from_value(collection, value)?;
        debug!(collection, records = loaded.len(), "loaded {:?}", path);
        Ok(loaded)
    }

    pub fn save(&self, collection: &Collection) -> Result<()> {
        self.save_with_layout(collection, Layout::Pretty)
    }

    pub fn save_with_layout(&self, collection: &Collection, layout: Layout) -> Result<()> {
        self.save_all(&[collection], layout)
    }

    /// Write several collections so that either every file is replaced or
    /// none is. Each one is rendered into a sibling `.tmp` file first; the
    /// originals are only swapped once all of them are staged.
    pub fn save_all(&self, collections: &[&Collection], layout: Layout) -> Result<()> {
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(collections.len());

        for collection in collections {
            let path = self.path_for(&collection.name);
            let staging = staging_path(&path);
            let written = render(collection, layout).and_then(|text| Ok(fs::write(&staging, text)?));

            if let Err(e) = written {
                for (staging, _) in &staged {
                    let _ = fs::remove_file(staging);
                }
                return Err(e);
            }
            staged.push((staging, path));
        }

        for (staging, path) in staged {
            fs::rename(&staging, &path)?;
            debug!(?layout, "saved {:?}", path);
        }
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Render a collection the way it is written to disk
pub fn render(collection: &Collection, layout: Layout) -> Result<String> {
    match layout {
        Layout::Pretty => Ok(serde_json::to_string_pretty(&collection.to_value())?),
        Layout::SameLine => {
            SameLineEncoder::new().encode(&collection.records, inline_rules(&collection.name))
        }
    }
}
