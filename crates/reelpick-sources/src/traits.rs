use async_trait::async_trait;
use reelpick_models::{CatalogEntry, WatchlistEntry};

use crate::SourceError;

/// Media server holding the movie catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Establish a session; every other call requires one
    async fn authenticate(&self) -> Result<(), SourceError>;

    /// Resolve the id of the top-level library folder with the given name
    async fn library_folder_id(&self, library_name: &str) -> Result<String, SourceError>;

    /// Every movie below `parent_folder_id`, without posters
    async fn fetch_all(&self, parent_folder_id: &str) -> Result<Vec<CatalogEntry>, SourceError>;

    async fn fetch_image(&self, external_id: &str) -> Result<Vec<u8>, SourceError>;
}

/// Exported list of movies the user intends to watch.
#[async_trait]
pub trait WatchlistSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Load the full list. Each call re-reads the source; nothing is patched incrementally.
    async fn load(&self) -> Result<Vec<WatchlistEntry>, SourceError>;
}
