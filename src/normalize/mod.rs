//! Normalization pipeline
//!
//! Each pass loads the collections it needs into a fresh [`Dataset`],
//! prints a summary, mutates the data, prints the summary again and writes
//! its target collections back. A pass that fails writes nothing, and the
//! pipeline stops there.

pub mod coerce;
pub mod compact;
pub mod dependencies;
pub mod gather;
pub mod ids;
pub mod maneuvers;
pub mod order;
pub mod passes;
pub mod references;
pub mod rename;

pub use dependencies::PassResolver;
pub use passes::{build_pass, get_pass, pass_names, PassContext, PassInfo, ALL_PASSES};

use std::collections::BTreeMap;
use tracing::info;

use crate::error::{DataError, Result};
use crate::store::{Collection, Layout, RecordStore};
use crate::ui::Ui;

/// The collections loaded for one pass
#[derive(Debug, Default)]
pub struct Dataset {
    collections: BTreeMap<String, Collection>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: Collection) {
        self.collections.insert(collection.name.clone(), collection);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Collection> {
        self.collections
            .get(name)
            .ok_or_else(|| DataError::CollectionNotLoaded(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Collection> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| DataError::CollectionNotLoaded(name.to_string()))
    }
}

/// One normalization pass.
///
/// Every pass states which collections it rewrites and reads, and must
/// supply both the operator summary and the transformation itself.
pub trait Pass {
    fn name(&self) -> &'static str;

    /// Collections this pass rewrites
    fn targets(&self) -> Vec<String>;

    /// Collections read for lookups only
    fn lookups(&self) -> Vec<String>;

    /// Print a summary of the current state of the data
    fn analyze(&self, data: &Dataset, ui: &mut dyn Ui) -> Result<()>;

    fn normalize(&mut self, data: &mut Dataset, ui: &mut dyn Ui) -> Result<()>;

    /// Layout for the written collections, when the pass dictates one
    fn layout(&self) -> Option<Layout> {
        None
    }
}

/// Runs passes against a record store, one after another
pub struct Pipeline<'a> {
    store: &'a RecordStore,
    layout: Layout,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a RecordStore, layout: Layout) -> Self {
        Self { store, layout }
    }

    /// Run every pass in order, stopping at the first failure
    pub fn run(&self, passes: &mut [Box<dyn Pass>], ui: &mut dyn Ui) -> Result<()> {
        for pass in passes.iter_mut() {
            self.run_pass(pass.as_mut(), ui)?;
        }
        Ok(())
    }

    pub fn run_pass(&self, pass: &mut dyn Pass, ui: &mut dyn Ui) -> Result<()> {
        ui.section(pass.name());

        let targets = pass.targets();
        let mut data = Dataset::new();
        for name in targets.iter().chain(pass.lookups().iter()) {
            if !data.contains(name) {
                data.insert(self.store.load(name)?);
            }
        }

        ui.log("BEFORE --------");
        pass.analyze(&data, ui)?;

        pass.normalize(&mut data, ui)?;

        ui.log("\nAFTER ---------");
        pass.analyze(&data, ui)?;

        let layout = pass.layout().unwrap_or(self.layout);
        let outputs = targets
            .iter()
            .map(|name| data.get(name))
            .collect::<Result<Vec<_>>>()?;
        self.store.save_all(&outputs, layout)?;

        info!(pass = pass.name(), collections = ?targets, "pass complete");
        Ok(())
    }
}
