//! Schema Synthesizer: derives a JSON-Schema document per collection from
//! the normalized records, plus one shared definitions document

pub mod audit;
pub mod definitions;
pub mod fields;
pub mod infer;
pub mod order;
pub mod types;

pub use audit::{audit, AuditReport};
pub use definitions::{SharedDefinitions, DEFINITIONS_TARGET};
pub use fields::{get_target, SchemaTarget, SCHEMA_TARGETS};
pub use infer::{infer_required, infer_schema, InferredSchema, SchemaNode};
pub use order::{SchemaOrder, PREFERRED_ORDER};
pub use types::JsonType;

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;
use crate::store::{Record, RecordStore};
use crate::ui::Ui;
use types::DRAFT_04;

/// Fields never listed as required
pub const NOT_REQUIRED: &[&str] = &["image"];

/// A synthesized document ready to be written
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    pub target: String,
    pub document: Value,
    pub audit: AuditReport,
}

/// Build the document for one target from its records
pub fn collection_document(target: &SchemaTarget, records: &[Record], host: &str) -> SchemaDocument {
    let declared = (target.fields)();
    let inferred = infer_schema(records, &declared, NOT_REQUIRED);
    let report = audit(&inferred.properties, &declared);

    let mut field_order = inferred.field_order;
    for key in target.order_tail {
        if !field_order.iter().any(|k| k == key) {
            field_order.push(key.to_string());
        }
    }

    let document = json!({
        "$schema": DRAFT_04,
        "id": format!("{}{}.json#", host, target.target),
        "title": target.title,
        "definitions": {},
        "type": "object",
        "required": inferred.required,
        "additionalProperties": false,
        "properties": inferred.properties,
    });

    SchemaDocument {
        target: target.target.to_string(),
        document: SchemaOrder::new(field_order).apply(document),
        audit: report,
    }
}

pub struct SchemaSynthesizer<'a> {
    store: &'a RecordStore,
    output: PathBuf,
    host: String,
}

impl<'a> SchemaSynthesizer<'a> {
    pub fn new(store: &'a RecordStore, output: impl Into<PathBuf>, host: impl Into<String>) -> Self {
        Self {
            store,
            output: output.into(),
            host: host.into(),
        }
    }

    pub fn path_for(&self, target: &str) -> PathBuf {
        self.output.join(format!("{}.json", target))
    }

    /// Records of every source collection of `target` that exists on disk
    fn load_sources(&self, target: &SchemaTarget) -> Result<Option<Vec<Record>>> {
        let mut records = Vec::new();
        let mut found = false;

        for source in target.sources {
            if !self.store.exists(source) {
                warn!(target = target.target, "{} not found, skipped", source);
                continue;
            }
            records.extend(self.store.load(source)?.records);
            found = true;
        }

        Ok(found.then_some(records))
    }

    /// Build every document without writing anything. The shared
    /// definitions come last.
    pub fn build(&self, ui: &mut dyn Ui) -> Result<Vec<SchemaDocument>> {
        let mut shared = SharedDefinitions::new();
        let mut documents = Vec::new();

        for target in SCHEMA_TARGETS {
            ui.section(&format!("Schema: {}", target.target));
            let Some(records) = self.load_sources(target)? else {
                ui.log("No data files, nothing to build");
                continue;
            };

            for record in &records {
                shared.observe(record);
            }

            let document = collection_document(target, &records, &self.host);
            ui.log(&format!(
                "{} records, {} properties, {} required",
                records.len(),
                document.document["properties"].as_object().map_or(0, |p| p.len()),
                document.document["required"].as_array().map_or(0, |r| r.len()),
            ));
            for line in document.audit.lines() {
                ui.log(&line);
            }
            documents.push(document);
        }

        documents.push(SchemaDocument {
            target: DEFINITIONS_TARGET.to_string(),
            document: shared.document(&self.host),
            audit: AuditReport::default(),
        });
        Ok(documents)
    }

    pub fn write(&self, documents: &[SchemaDocument]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output)?;

        let mut written = Vec::new();
        for document in documents {
            let path = self.path_for(&document.target);
            write_document(&path, &document.document)?;
            written.push(path);
        }
        Ok(written)
    }

    pub fn run(&self, ui: &mut dyn Ui) -> Result<Vec<PathBuf>> {
        let documents = self.build(ui)?;
        let written = self.write(&documents)?;
        info!(documents = written.len(), "schemas written to {:?}", self.output);
        Ok(written)
    }
}

fn write_document(path: &Path, document: &Value) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(document)?)?;
    Ok(())
}
