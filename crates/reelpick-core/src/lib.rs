pub mod error;
pub mod normalize;
pub mod progress;
pub mod reconcile;
pub mod select;
pub mod store;
pub mod sync;

pub use error::{CoreError, Result};
pub use normalize::normalize;
pub use reconcile::{reconcile, ReconcileReport, Reconciler};
pub use select::RandomSelector;
pub use store::{CatalogStore, PairingStore, SqliteStore, StoreError};
pub use sync::{CatalogSync, ImageFailure, ProgressCallback, SyncOptions, SyncProgress, SyncReport};
