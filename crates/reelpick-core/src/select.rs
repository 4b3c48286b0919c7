use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use reelpick_models::{Pool, ResolvedItem};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::store::{CatalogStore, PairingStore, StoreError};
use crate::{CoreError, Result};

/// Draw rounds against the store before completing from the full id listing
const MAX_DRAW_ROUNDS: usize = 4;

/// A reference drawn from a pool, not yet resolved against the catalog
#[derive(Debug, Clone)]
struct Candidate {
    id: String,
    added_date: Option<NaiveDate>,
}

/// Picks random movies from the catalog or from the watchlist pairs.
///
/// The generator is seeded once at construction and shared by every call.
pub struct RandomSelector {
    catalog: Arc<dyn CatalogStore>,
    pairing: Arc<dyn PairingStore>,
    rng: Mutex<StdRng>,
}

impl RandomSelector {
    pub fn new(catalog: Arc<dyn CatalogStore>, pairing: Arc<dyn PairingStore>) -> Self {
        Self::with_rng(catalog, pairing, StdRng::from_entropy())
    }

    pub fn with_seed(catalog: Arc<dyn CatalogStore>, pairing: Arc<dyn PairingStore>, seed: u64) -> Self {
        Self::with_rng(catalog, pairing, StdRng::seed_from_u64(seed))
    }

    fn with_rng(catalog: Arc<dyn CatalogStore>, pairing: Arc<dyn PairingStore>, rng: StdRng) -> Self {
        Self {
            catalog,
            pairing,
            rng: Mutex::new(rng),
        }
    }

    /// Return exactly `count` distinct movies from `pool`, in random order
    pub async fn pick(&self, pool: Pool, count: usize) -> Result<Vec<ResolvedItem>> {
        if count == 0 {
            return Err(CoreError::Validation("count must be at least 1".to_string()));
        }

        let available = match pool {
            Pool::Catalog => self.catalog.count().await?,
            Pool::Watchlist => self.pairing.distinct_catalog_count().await?,
        };
        if available == 0 {
            return Err(CoreError::EmptyPool(pool));
        }
        if available < count {
            return Err(CoreError::InsufficientPool {
                pool,
                requested: count,
                available,
            });
        }

        let mut batch = Batch::new(count);

        for round in 0..MAX_DRAW_ROUNDS {
            if batch.is_full() {
                break;
            }
            let candidates = self.draw(pool, batch.missing()).await?;
            if candidates.is_empty() {
                break;
            }
            debug!(%pool, round, drawn = candidates.len(), "Random draw");
            for candidate in candidates {
                if batch.is_full() {
                    break;
                }
                if batch.claim(&candidate.id) {
                    self.resolve(candidate, &mut batch).await;
                }
            }
        }

        if !batch.is_full() {
            let mut remaining: Vec<Candidate> = self
                .listing(pool)
                .await?
                .into_iter()
                .filter(|c| !batch.seen.contains(&c.id))
                .collect();
            self.shuffle(&mut remaining);
            debug!(%pool, remaining = remaining.len(), "Completing pick from full listing");

            for candidate in remaining {
                if batch.is_full() {
                    break;
                }
                if batch.claim(&candidate.id) {
                    self.resolve(candidate, &mut batch).await;
                }
            }
        }

        if !batch.is_full() {
            if let Some(StoreError::Database(err)) = batch.last_error {
                return Err(CoreError::unavailable("store", err.to_string()));
            }
            return Err(CoreError::InsufficientPool {
                pool,
                requested: count,
                available: available.saturating_sub(batch.failed),
            });
        }

        let mut items = batch.items;
        self.shuffle(&mut items);
        Ok(items)
    }

    async fn draw(&self, pool: Pool, needed: usize) -> Result<Vec<Candidate>> {
        let candidates = match pool {
            Pool::Catalog => self
                .catalog
                .random_sample(needed)
                .await?
                .into_iter()
                .map(|entry| Candidate {
                    id: entry.external_id,
                    added_date: None,
                })
                .collect(),
            // Pairs repeat catalog ids, so ask for more than needed
            Pool::Watchlist => self
                .pairing
                .random_sample(needed.saturating_mul(2))
                .await?
                .into_iter()
                .map(|pair| Candidate {
                    id: pair.catalog_id,
                    added_date: pair.added_date,
                })
                .collect(),
        };
        Ok(candidates)
    }

    async fn listing(&self, pool: Pool) -> Result<Vec<Candidate>> {
        let candidates = match pool {
            Pool::Catalog => self
                .catalog
                .ids()
                .await?
                .into_iter()
                .map(|id| Candidate { id, added_date: None })
                .collect(),
            Pool::Watchlist => self
                .pairing
                .distinct_by_catalog()
                .await?
                .into_iter()
                .map(|pair| Candidate {
                    id: pair.catalog_id,
                    added_date: pair.added_date,
                })
                .collect(),
        };
        Ok(candidates)
    }

    async fn resolve(&self, candidate: Candidate, batch: &mut Batch) {
        match self.catalog.get_by_id(&candidate.id).await {
            Ok(entry) => batch
                .items
                .push(ResolvedItem::from_entry(entry, candidate.added_date)),
            Err(err) => {
                warn!(id = %candidate.id, error = %err, "Failed to resolve picked movie, drawing a replacement");
                batch.failed += 1;
                batch.last_error = Some(err);
            }
        }
    }

    fn shuffle<T>(&self, items: &mut [T]) {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        items.shuffle(&mut *rng);
    }
}

/// Progress of a single pick call
struct Batch {
    count: usize,
    items: Vec<ResolvedItem>,
    seen: HashSet<String>,
    failed: usize,
    last_error: Option<StoreError>,
}

impl Batch {
    fn new(count: usize) -> Self {
        Self {
            count,
            items: Vec::with_capacity(count),
            seen: HashSet::new(),
            failed: 0,
            last_error: None,
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.count
    }

    fn missing(&self) -> usize {
        self.count - self.items.len()
    }

    /// False when the id was already drawn in this call
    fn claim(&mut self, id: &str) -> bool {
        self.seen.insert(id.to_string())
    }
}
