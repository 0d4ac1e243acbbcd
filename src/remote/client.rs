use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

/// One entry of a reserved-id listing
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReservedId {
    pub name: String,
    pub id: i64,
}

pub struct MemoryClient {
    client: Client,
}

impl MemoryClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent("xwing-data-tools")
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    /// Fetch the `name -> id` mapping previously assigned to a collection
    pub fn fetch_reserved_ids(&self, url: &str) -> Result<BTreeMap<String, i64>> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch reserved ids from {}", url))?;

        if !response.status().is_success() {
            bail!("Reserved id listing {} returned {}", url, response.status());
        }

        let text = response.text().context("Failed to read response")?;
        parse_reserved_ids(&text)
    }
}

/// Parse `[{"name": .., "id": ..}, ..]`. Later entries win on duplicate names.
pub fn parse_reserved_ids(text: &str) -> Result<BTreeMap<String, i64>> {
    let entries: Vec<ReservedId> =
        serde_json::from_str(text).context("Failed to parse reserved id listing")?;
    Ok(entries.into_iter().map(|e| (e.name, e.id)).collect())
}
