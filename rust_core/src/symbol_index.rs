//! Symbol -> identifier index for mention resolution.
//!
//! This module provides:
//! - Case-insensitive, sigil-insensitive lookup of catalog identifiers
//! - Build-once semantics: the index is read-only after construction
//! - JSON snapshot persistence of the raw catalog

use crate::clients::PriceService;
use crate::extract::normalize_symbol;
use crate::models::CatalogEntry;
use crate::throttle::Throttle;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Where the catalog behind an index came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogSource {
    /// Local snapshot file
    Snapshot,
    /// Fresh catalog call
    Network,
    /// Catalog could not be obtained; every lookup misses
    #[default]
    Unavailable,
}

/// Read-only mapping from normalized symbol to canonical identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolIndex {
    /// "doge" -> "dogecoin"
    ids: HashMap<String, String>,
    /// Symbols whose identifier was replaced by a later catalog entry
    overwritten: usize,
    source: CatalogSource,
}

impl SymbolIndex {
    /// Empty index; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from catalog entries. When several entries share a symbol the
    /// last one wins.
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let mut ids: HashMap<String, String> = HashMap::with_capacity(entries.len());
        let mut overwritten = 0;

        for entry in entries {
            let key = normalize_symbol(&entry.symbol);
            if key.is_empty() {
                continue;
            }
            if let Some(previous) = ids.insert(key, entry.id.clone()) {
                if previous != entry.id {
                    overwritten += 1;
                }
            }
        }

        Self {
            ids,
            overwritten,
            source: CatalogSource::Unavailable,
        }
    }

    fn with_source(mut self, source: CatalogSource) -> Self {
        self.source = source;
        self
    }

    /// Look up the identifier for a raw or normalized symbol.
    pub fn resolve(&self, symbol: &str) -> Option<&str> {
        self.ids.get(&normalize_symbol(symbol)).map(|s| s.as_str())
    }

    /// Get number of symbols.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if index is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of symbols that had more than one catalog identifier.
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }

    pub fn source(&self) -> CatalogSource {
        self.source
    }

    /// Obtain the index for this run.
    ///
    /// A readable snapshot at `snapshot_path` is authoritative. Otherwise the
    /// catalog is fetched once and written to `snapshot_path`. A failed fetch
    /// yields an empty index; the run carries on without resolution.
    pub async fn load_or_fetch(
        service: &dyn PriceService,
        throttle: &dyn Throttle,
        snapshot_path: &Path,
    ) -> Self {
        match load_snapshot(snapshot_path) {
            Ok(Some(entries)) => {
                info!(
                    "Loaded {} catalog entries from {}",
                    entries.len(),
                    snapshot_path.display()
                );
                return Self::from_entries(&entries)
                    .logged()
                    .with_source(CatalogSource::Snapshot);
            }
            Ok(None) => {
                debug!("No catalog snapshot at {}", snapshot_path.display());
            }
            Err(e) => {
                warn!("Ignoring unreadable catalog snapshot: {:#}", e);
            }
        }

        info!("Fetching catalog from {}", service.service_name());
        let result = service.coin_list().await;
        throttle.pause().await;

        match result {
            Ok(entries) => {
                if let Err(e) = save_snapshot(snapshot_path, &entries) {
                    warn!("Failed to persist catalog snapshot: {:#}", e);
                } else {
                    info!(
                        "Saved {} catalog entries to {}",
                        entries.len(),
                        snapshot_path.display()
                    );
                }
                Self::from_entries(&entries)
                    .logged()
                    .with_source(CatalogSource::Network)
            }
            Err(e) => {
                warn!(
                    "Failed to fetch catalog from {} ({}); symbols will not resolve this run",
                    service.service_name(),
                    e
                );
                Self::new()
            }
        }
    }

    fn logged(self) -> Self {
        info!("Symbol index ready: {} symbols", self.len());
        if self.overwritten > 0 {
            // Ambiguous tickers keep the last catalog entry
            info!(
                "{} symbols map to several identifiers; last catalog entry kept",
                self.overwritten
            );
        }
        self
    }
}

/// Read a catalog snapshot. `Ok(None)` when the file does not exist.
pub fn load_snapshot(path: &Path) -> Result<Option<Vec<CatalogEntry>>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let entries: Vec<CatalogEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(Some(entries))
}

/// Write the catalog as received, unknown entry fields included.
pub fn save_snapshot(path: &Path, entries: &[CatalogEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = serde_json::to_string(entries)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ServiceError;
    use crate::throttle::FixedDelayThrottle;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct FakeCatalog {
        entries: Option<Vec<CatalogEntry>>,
        calls: AtomicU32,
    }

    impl FakeCatalog {
        fn ok(entries: Vec<CatalogEntry>) -> Self {
            Self {
                entries: Some(entries),
                calls: AtomicU32::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                entries: None,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PriceService for FakeCatalog {
        fn service_name(&self) -> &str {
            "fake"
        }

        async fn coin_list(&self) -> Result<Vec<CatalogEntry>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entries.clone().ok_or(ServiceError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }

        async fn price_on(
            &self,
            _coin_id: &str,
            _date: NaiveDate,
            _quote: &str,
        ) -> Result<Option<f64>, ServiceError> {
            Ok(None)
        }
    }

    fn catalog() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new("dogecoin", "doge", "Dogecoin"),
            CatalogEntry::new("bitcoin", "btc", "Bitcoin"),
            CatalogEntry::new("pepe", "PEPE", "Pepe"),
        ]
    }

    fn no_wait() -> FixedDelayThrottle {
        FixedDelayThrottle::new(Duration::ZERO)
    }

    #[test]
    fn test_resolve_ignores_case_and_sigil() {
        let index = SymbolIndex::from_entries(&catalog());

        assert_eq!(index.resolve("doge"), Some("dogecoin"));
        assert_eq!(index.resolve("$DOGE"), Some("dogecoin"));
        assert_eq!(index.resolve("Pepe"), Some("pepe"));
        assert_eq!(index.resolve("$wif"), None);
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let index = SymbolIndex::from_entries(&catalog());
        assert_eq!(index.resolve("btc"), index.resolve("btc"));
    }

    #[test]
    fn test_last_entry_wins() {
        let entries = vec![
            CatalogEntry::new("dogecoin", "doge", "Dogecoin"),
            CatalogEntry::new("doge-on-base", "DOGE", "Doge on Base"),
            CatalogEntry::new("bitcoin", "btc", "Bitcoin"),
        ];
        let index = SymbolIndex::from_entries(&entries);

        assert_eq!(index.resolve("doge"), Some("doge-on-base"));
        assert_eq!(index.len(), 2);
        assert_eq!(index.overwritten(), 1);
    }

    #[test]
    fn test_empty_index_misses() {
        let index = SymbolIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.resolve("doge"), None);
        assert_eq!(index.source(), CatalogSource::Unavailable);
    }

    #[test]
    fn test_snapshot_roundtrip_builds_same_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coin_ids.json");

        save_snapshot(&path, &catalog()).unwrap();
        let loaded = load_snapshot(&path).unwrap().unwrap();

        assert_eq!(loaded, catalog());
        assert_eq!(
            SymbolIndex::from_entries(&loaded),
            SymbolIndex::from_entries(&catalog())
        );
    }

    #[test]
    fn test_snapshot_keeps_every_catalog_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coin_ids.json");
        let response = r#"[{"id":"dogecoin","symbol":"doge","name":"Dogecoin","platforms":{}}]"#;
        let entries: Vec<CatalogEntry> = serde_json::from_str(response).unwrap();

        save_snapshot(&path, &entries).unwrap();

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let expected: serde_json::Value = serde_json::from_str(response).unwrap();
        assert_eq!(on_disk, expected);
    }

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_snapshot(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coin_ids.json");
        fs::write(&path, "not json").unwrap();
        assert!(load_snapshot(&path).is_err());
    }

    #[tokio::test]
    async fn test_fetch_persists_and_second_run_uses_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("coin_ids.json");
        let throttle = no_wait();

        let service = FakeCatalog::ok(catalog());
        let first = SymbolIndex::load_or_fetch(&service, &throttle, &path).await;
        assert_eq!(first.source(), CatalogSource::Network);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(throttle.pauses(), 1);
        assert!(path.exists());

        let offline = FakeCatalog::failing();
        let second = SymbolIndex::load_or_fetch(&offline, &throttle, &path).await;
        assert_eq!(second.source(), CatalogSource::Snapshot);
        assert_eq!(offline.calls.load(Ordering::SeqCst), 0);
        assert_eq!(first.resolve("doge"), second.resolve("doge"));
        assert_eq!(first.len(), second.len());
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coin_ids.json");
        let throttle = no_wait();

        let service = FakeCatalog::failing();
        let index = SymbolIndex::load_or_fetch(&service, &throttle, &path).await;

        assert!(index.is_empty());
        assert_eq!(index.source(), CatalogSource::Unavailable);
        assert_eq!(throttle.pauses(), 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_falls_back_to_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coin_ids.json");
        fs::write(&path, "{ truncated").unwrap();

        let service = FakeCatalog::ok(catalog());
        let index = SymbolIndex::load_or_fetch(&service, &no_wait(), &path).await;

        assert_eq!(index.source(), CatalogSource::Network);
        assert_eq!(index.resolve("btc"), Some("bitcoin"));
        assert_eq!(load_snapshot(&path).unwrap().unwrap(), catalog());
    }
}
