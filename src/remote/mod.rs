//! Preload of previously assigned ids, so regenerated records keep their ids

pub mod cache;
pub mod client;

pub use cache::*;
pub use client::*;

use std::collections::BTreeMap;
use tracing::{info, warn};

/// Reserved ids for a collection.
///
/// Fetches from `url` unless `offline`, refreshing the cache on success. A
/// failed or skipped fetch falls back to the cache, then to an empty map, so
/// id assignment is never blocked by the network.
pub fn reserved_ids_for(
    collection: &str,
    url: Option<&str>,
    cache: Option<&CacheManager>,
    offline: bool,
) -> BTreeMap<String, i64> {
    let Some(url) = url else {
        return BTreeMap::new();
    };

    if !offline {
        match MemoryClient::new().and_then(|client| client.fetch_reserved_ids(url)) {
            Ok(ids) => {
                info!(collection, count = ids.len(), "fetched reserved ids");
                if let Some(cache) = cache {
                    if let Err(e) = cache.store(collection, &ids) {
                        warn!(collection, "could not cache reserved ids: {:#}", e);
                    }
                }
                return ids;
            }
            Err(e) => warn!(collection, "reserved id fetch failed: {:#}", e),
        }
    }

    match cache {
        Some(cache) if cache.is_cached(collection) => match cache.load(collection) {
            Ok(ids) => {
                info!(collection, count = ids.len(), "using cached reserved ids");
                ids
            }
            Err(e) => {
                warn!(collection, "ignoring unreadable id cache: {:#}", e);
                BTreeMap::new()
            }
        },
        _ => BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_url_means_no_reserved_ids() {
        assert!(reserved_ids_for("ships", None, None, false).is_empty());
    }

    #[test]
    fn test_offline_uses_cache() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::new(Some(dir.path().to_path_buf())).unwrap();
        let ids = BTreeMap::from([("X-Wing".to_string(), 1)]);
        cache.store("ships", &ids).unwrap();

        let loaded = reserved_ids_for("ships", Some("http://127.0.0.1:9/ids"), Some(&cache), true);
        assert_eq!(loaded, ids);
    }

    #[test]
    fn test_offline_without_cache_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::new(Some(dir.path().to_path_buf())).unwrap();

        let loaded = reserved_ids_for("pilots", Some("http://127.0.0.1:9/ids"), Some(&cache), true);
        assert!(loaded.is_empty());
    }
}
