//! Rewrites collections in the same-line layout without changing their data

use super::{Dataset, Pass};
use crate::error::Result;
use crate::store::{inline_rules, Layout};
use crate::ui::Ui;

pub const COMPACT_COLLECTIONS: &[&str] = &["ships", "sources", "pilots", "upgrades"];

pub struct CompactPass {
    collections: Vec<String>,
}

impl CompactPass {
    pub fn new(collections: Vec<String>) -> Self {
        Self { collections }
    }

    pub fn standard() -> Self {
        Self::new(COMPACT_COLLECTIONS.iter().map(|s| s.to_string()).collect())
    }
}

impl Pass for CompactPass {
    fn name(&self) -> &'static str {
        "compact"
    }

    fn targets(&self) -> Vec<String> {
        self.collections.clone()
    }

    fn lookups(&self) -> Vec<String> {
        Vec::new()
    }

    fn analyze(&self, data: &Dataset, ui: &mut dyn Ui) -> Result<()> {
        for name in &self.collections {
            let paths: Vec<String> = inline_rules(name)
                .iter()
                .map(|rule| format!("{}:{:?}", rule.path.join("."), rule.inline))
                .collect();
            ui.log(&format!("{} ({} records): inline {:?}", name, data.get(name)?.len(), paths));
        }
        Ok(())
    }

    fn normalize(&mut self, _data: &mut Dataset, _ui: &mut dyn Ui) -> Result<()> {
        Ok(())
    }

    fn layout(&self) -> Option<Layout> {
        Some(Layout::SameLine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Pipeline;
    use crate::store::RecordStore;
    use crate::ui::SilentUi;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_compact_rewrites_layout_only() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path(), "js");
        let pilots = json!([{"id": 1, "name": "Wedge Antilles", "ship": {"ship_id": 1, "name": "X-Wing"}}]);
        fs::write(store.path_for("pilots"), serde_json::to_string_pretty(&pilots).unwrap()).unwrap();

        let mut pass = CompactPass::new(vec!["pilots".to_string()]);
        Pipeline::new(&store, Layout::Pretty)
            .run_pass(&mut pass, &mut SilentUi::new())
            .unwrap();

        let text = fs::read_to_string(store.path_for("pilots")).unwrap();
        assert!(text.contains(r#""ship": {"ship_id": 1, "name": "X-Wing"}"#));
        assert_eq!(store.load("pilots").unwrap().to_value(), pilots);
    }
}
