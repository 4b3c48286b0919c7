use reelpick_models::{CatalogEntry, ReconciledPair, WatchlistEntry};
use reelpick_sources::WatchlistSource;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::normalize::normalize;
use crate::store::{CatalogStore, PairingStore};
use crate::{CoreError, Result};

/// Join the catalog and the watchlist into pairs.
///
/// A pair is emitted for every catalog/watchlist combination whose normalized titles
/// are equal and whose release years are equal and known. Nothing is deduplicated:
/// duplicate watchlist rows each produce their own pair.
pub fn reconcile(catalog: &[CatalogEntry], watchlist: &[WatchlistEntry]) -> Vec<ReconciledPair> {
    let mut index: HashMap<(String, u32), Vec<&CatalogEntry>> = HashMap::new();
    for entry in catalog.iter().filter(|e| e.has_known_year() && !e.is_placeholder()) {
        let key = normalize(&entry.title);
        if key.is_empty() {
            continue;
        }
        index.entry((key, entry.release_year)).or_default().push(entry);
    }

    let mut pairs = Vec::new();
    for row in watchlist.iter().filter(|w| w.has_known_year()) {
        let key = normalize(&row.title);
        if key.is_empty() {
            continue;
        }
        if let Some(matches) = index.get(&(key, row.release_year)) {
            pairs.extend(matches.iter().map(|entry| ReconciledPair::link(entry, row)));
        }
    }
    pairs
}

#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub catalog_entries: usize,
    pub watchlist_entries: usize,
    pub pairs: usize,
    pub duration: Duration,
}

/// Loads both sides, reconciles them and persists the pairs in one batch
pub struct Reconciler {
    catalog: Arc<dyn CatalogStore>,
    watchlist: Arc<dyn WatchlistSource>,
    pairing: Arc<dyn PairingStore>,
}

impl Reconciler {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        watchlist: Arc<dyn WatchlistSource>,
        pairing: Arc<dyn PairingStore>,
    ) -> Self {
        Self {
            catalog,
            watchlist,
            pairing,
        }
    }

    pub async fn run(&self, cancel: &CancellationToken) -> Result<ReconcileReport> {
        let start = Instant::now();

        let catalog = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CoreError::Cancelled),
            result = self.catalog.list_all() => result?,
        };
        let watchlist = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CoreError::Cancelled),
            result = self.watchlist.load() => result?,
        };
        debug!(
            catalog = catalog.len(),
            watchlist = watchlist.len(),
            "Loaded reconciliation inputs"
        );

        let pairs = reconcile(&catalog, &watchlist);

        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        // Not raced against the token: the insert is one transaction and must finish or fail whole
        self.pairing.insert_all(&pairs).await?;

        let report = ReconcileReport {
            catalog_entries: catalog.len(),
            watchlist_entries: watchlist.len(),
            pairs: pairs.len(),
            duration: start.elapsed(),
        };
        info!(
            "Reconciliation completed: {} pairs from {} catalog entries and {} watchlist rows in {:.1}s",
            report.pairs,
            report.catalog_entries,
            report.watchlist_entries,
            report.duration.as_secs_f64()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use reelpick_sources::SourceError;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use crate::store::{SqliteStore, StoreError};

    fn watch(row: u32, title: &str, year: u32) -> WatchlistEntry {
        WatchlistEntry {
            row,
            title: title.to_string(),
            date_added: NaiveDate::from_ymd_opt(2020, 4, 26),
            release_year: year,
        }
    }

    #[test]
    fn test_single_match() {
        let catalog = vec![CatalogEntry::new("1", "Lady Bird", 2017)];
        let watchlist = vec![watch(1, "lady bird", 2017)];

        let pairs = reconcile(&catalog, &watchlist);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].catalog_id, "1");
        assert_eq!(pairs[0].watchlist_row, 1);
        assert_eq!(pairs[0].added_date, NaiveDate::from_ymd_opt(2020, 4, 26));
    }

    #[test]
    fn test_unknown_years_never_match() {
        let catalog = vec![CatalogEntry::new("1", "Columbus", 0)];
        let watchlist = vec![watch(1, "Columbus", 0)];
        assert!(reconcile(&catalog, &watchlist).is_empty());

        let catalog = vec![CatalogEntry::new("1", "Columbus", 2017)];
        assert!(reconcile(&catalog, &watchlist).is_empty());
    }

    #[test]
    fn test_year_mismatch() {
        let catalog = vec![CatalogEntry::new("1", "Suspiria", 1977)];
        let watchlist = vec![watch(1, "Suspiria", 2018)];
        assert!(reconcile(&catalog, &watchlist).is_empty());
    }

    #[test]
    fn test_placeholders_and_empty_keys_never_match() {
        let catalog = vec![CatalogEntry::new("1", "", 2017), CatalogEntry::new("2", "...", 2017)];
        let watchlist = vec![watch(1, "...", 2017), watch(2, "'", 2017)];
        assert!(reconcile(&catalog, &watchlist).is_empty());
    }

    #[test]
    fn test_multiplicity_is_preserved() {
        let catalog = vec![
            CatalogEntry::new("a", "Alien", 1979),
            CatalogEntry::new("b", "Alien", 1979),
        ];
        let watchlist = vec![watch(1, "Alien", 1979), watch(2, "ALIEN", 1979)];

        let pairs = reconcile(&catalog, &watchlist);
        assert_eq!(pairs.len(), 4);
        let distinct: HashSet<_> = pairs.iter().map(|p| (p.catalog_id.clone(), p.watchlist_row)).collect();
        assert_eq!(distinct.len(), 4);
    }

    #[test]
    fn test_matches_cross_product_definition() {
        let catalog = vec![
            CatalogEntry::new("1", "Let's Go. Now", 2001),
            CatalogEntry::new("2", "The Matrix!", 1999),
            CatalogEntry::new("3", "Heat", 1995),
            CatalogEntry::new("4", "Heat", 1986),
            CatalogEntry::new("5", "Nope", 0),
        ];
        let watchlist = vec![
            watch(1, "lets go now", 2001),
            watch(2, "the matrix!", 1999),
            watch(3, "The Matrix", 1999),
            watch(4, "Heat", 1995),
            watch(5, "Nope", 0),
        ];

        let expected: HashSet<(String, u32)> = catalog
            .iter()
            .flat_map(|c| watchlist.iter().map(move |w| (c, w)))
            .filter(|(c, w)| {
                normalize(&c.title) == normalize(&w.title)
                    && c.release_year == w.release_year
                    && c.release_year != 0
            })
            .map(|(c, w)| (c.external_id.clone(), w.row))
            .collect();

        let actual: HashSet<(String, u32)> = reconcile(&catalog, &watchlist)
            .into_iter()
            .map(|p| (p.catalog_id, p.watchlist_row))
            .collect();

        assert_eq!(actual, expected);
        assert_eq!(
            actual,
            HashSet::from([("1".to_string(), 1), ("2".to_string(), 2), ("3".to_string(), 4)])
        );
    }

    #[test]
    fn test_deterministic() {
        let catalog = vec![CatalogEntry::new("1", "Heat", 1995), CatalogEntry::new("2", "Ran", 1985)];
        let watchlist = vec![watch(1, "Ran", 1985), watch(2, "Heat", 1995)];

        let first: HashSet<_> = reconcile(&catalog, &watchlist).into_iter().collect();
        let second: HashSet<_> = reconcile(&catalog, &watchlist).into_iter().collect();
        assert_eq!(first, second);
    }

    struct FixedWatchlist(std::result::Result<Vec<WatchlistEntry>, String>);

    #[async_trait]
    impl WatchlistSource for FixedWatchlist {
        fn source_name(&self) -> &str {
            "fixed"
        }

        async fn load(&self) -> std::result::Result<Vec<WatchlistEntry>, SourceError> {
            self.0.clone().map_err(|e| SourceError::new("fixed", e))
        }
    }

    /// Records every batch handed to it
    #[derive(Default)]
    struct RecordingPairs {
        batches: Mutex<Vec<Vec<ReconciledPair>>>,
    }

    #[async_trait]
    impl PairingStore for RecordingPairs {
        async fn insert_all(&self, pairs: &[ReconciledPair]) -> std::result::Result<(), StoreError> {
            self.batches.lock().unwrap().push(pairs.to_vec());
            Ok(())
        }

        async fn random_sample(&self, _count: usize) -> std::result::Result<Vec<ReconciledPair>, StoreError> {
            Ok(Vec::new())
        }

        async fn distinct_catalog_count(&self) -> std::result::Result<usize, StoreError> {
            Ok(0)
        }

        async fn distinct_by_catalog(&self) -> std::result::Result<Vec<ReconciledPair>, StoreError> {
            Ok(Vec::new())
        }

        async fn clear(&self) -> std::result::Result<(), StoreError> {
            Ok(())
        }
    }

    async fn catalog_store() -> Arc<SqliteStore> {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .upsert_all(&[CatalogEntry::new("1", "Lady Bird", 2017), CatalogEntry::new("2", "Columbus", 2017)])
            .await
            .unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_run_persists_pairs_in_one_batch() {
        let store = catalog_store().await;
        let pairs = Arc::new(RecordingPairs::default());
        let watchlist = Arc::new(FixedWatchlist(Ok(vec![
            watch(1, "Lady Bird", 2017),
            watch(2, "Columbus", 2017),
            watch(3, "Unknown", 2017),
        ])));

        let reconciler = Reconciler::new(store, watchlist, pairs.clone());
        let report = reconciler.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(report.pairs, 2);
        assert_eq!(report.watchlist_entries, 3);
        let batches = pairs.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    #[tokio::test]
    async fn test_run_aborts_when_watchlist_unavailable() {
        let store = catalog_store().await;
        let pairs = Arc::new(RecordingPairs::default());
        let watchlist = Arc::new(FixedWatchlist(Err("file missing".to_string())));

        let reconciler = Reconciler::new(store, watchlist, pairs.clone());
        let err = reconciler.run(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, CoreError::SourceUnavailable { .. }));
        assert!(pairs.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_run_writes_nothing() {
        let store = catalog_store().await;
        let pairs = Arc::new(RecordingPairs::default());
        let watchlist = Arc::new(FixedWatchlist(Ok(vec![watch(1, "Lady Bird", 2017)])));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let reconciler = Reconciler::new(store, watchlist, pairs.clone());
        let err = reconciler.run(&cancel).await.unwrap_err();
        assert!(matches!(err, CoreError::Cancelled));
        assert!(pairs.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_against_sqlite_pairs() {
        let store = catalog_store().await;
        let watchlist = Arc::new(FixedWatchlist(Ok(vec![watch(1, "lady bird", 2017), watch(2, "Lady Bird", 2017)])));

        let reconciler = Reconciler::new(store.clone(), watchlist, store.clone());
        reconciler.run(&CancellationToken::new()).await.unwrap();
        // A second run over the same inputs adds nothing new
        reconciler.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(store.distinct_catalog_count().await.unwrap(), 1);
        assert_eq!(PairingStore::random_sample(store.as_ref(), 10).await.unwrap().len(), 2);
    }
}
