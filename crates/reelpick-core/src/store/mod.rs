//! Persistence ports for the catalog and the reconciled pairs

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use reelpick_models::{CatalogEntry, ReconciledPair};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert every entry in one transaction. Existing ids are left untouched,
    /// except that a poster is attached to an entry that has none yet.
    async fn upsert_all(&self, entries: &[CatalogEntry]) -> Result<(), StoreError>;

    /// Up to `count` entries in random order, without posters
    async fn random_sample(&self, count: usize) -> Result<Vec<CatalogEntry>, StoreError>;

    /// Full entry including its poster
    async fn get_by_id(&self, external_id: &str) -> Result<CatalogEntry, StoreError>;

    async fn list_all(&self) -> Result<Vec<CatalogEntry>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    async fn ids(&self) -> Result<Vec<String>, StoreError>;

    /// Remove every entry, and with them every pair
    async fn clear(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PairingStore: Send + Sync {
    /// Replace every stored pair with `pairs`, all-or-nothing.
    /// On failure the previous set is kept.
    async fn insert_all(&self, pairs: &[ReconciledPair]) -> Result<(), StoreError>;

    /// Up to `count` pairs in random order. Several pairs may share a catalog id.
    async fn random_sample(&self, count: usize) -> Result<Vec<ReconciledPair>, StoreError>;

    async fn distinct_catalog_count(&self) -> Result<usize, StoreError>;

    /// One pair per distinct catalog id, the earliest watchlist row winning
    async fn distinct_by_catalog(&self) -> Result<Vec<ReconciledPair>, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}
