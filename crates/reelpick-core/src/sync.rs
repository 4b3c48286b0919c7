use futures::stream::{self, StreamExt};
use reelpick_models::CatalogEntry;
use reelpick_sources::{CatalogSource, SourceError, SourceErrorKind};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::progress::ProgressTracker;
use crate::store::CatalogStore;
use crate::{CoreError, Result};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub library_name: String,
    pub fetch_images: bool,
    /// Poster downloads in flight at once
    pub image_concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            library_name: "Movies".to_string(),
            fetch_images: true,
            image_concurrency: 4,
        }
    }
}

/// Milestones reported while a sync runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncProgress {
    Authenticated,
    Listed { total: usize },
    PosterFetched { done: usize, total: usize },
    Stored { entries: usize },
}

pub type ProgressCallback = Arc<dyn Fn(SyncProgress) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ImageFailure {
    pub external_id: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub fetched: usize,
    pub images_fetched: usize,
    pub image_failures: Vec<ImageFailure>,
    pub duration: Duration,
}

/// Copies the catalog from the media server into the catalog store
pub struct CatalogSync {
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn CatalogStore>,
    options: SyncOptions,
    progress: Option<ProgressCallback>,
}

impl CatalogSync {
    pub fn new(source: Arc<dyn CatalogSource>, store: Arc<dyn CatalogStore>, options: SyncOptions) -> Self {
        Self {
            source,
            store,
            options,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn report(&self, event: SyncProgress) {
        if let Some(callback) = &self.progress {
            callback(event);
        }
    }

    #[instrument(skip_all)]
    pub async fn run(&self, cancel: &CancellationToken) -> Result<SyncReport> {
        let start = Instant::now();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CoreError::Cancelled),
            result = self.source.authenticate() => result?,
        }
        self.report(SyncProgress::Authenticated);

        let folder_id = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CoreError::Cancelled),
            result = self.source.library_folder_id(&self.options.library_name) => result?,
        };

        let mut entries = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CoreError::Cancelled),
            result = self.source.fetch_all(&folder_id) => result?,
        };
        self.report(SyncProgress::Listed { total: entries.len() });
        info!("Listed {} movies in library '{}'", entries.len(), self.options.library_name);

        let image_failures = if self.options.fetch_images {
            self.fetch_posters(&mut entries, cancel).await?
        } else {
            debug!("Poster download disabled");
            Vec::new()
        };

        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        self.store.upsert_all(&entries).await?;
        self.report(SyncProgress::Stored { entries: entries.len() });

        let report = SyncReport {
            fetched: entries.len(),
            images_fetched: entries.iter().filter(|e| e.poster_image.is_some()).count(),
            image_failures,
            duration: start.elapsed(),
        };
        info!(
            "Catalog sync completed: {} movies, {} posters, {} poster failures in {:.1}s",
            report.fetched,
            report.images_fetched,
            report.image_failures.len(),
            report.duration.as_secs_f64()
        );
        Ok(report)
    }

    /// Fetch every poster independently; a failure only costs that entry its poster
    async fn fetch_posters(
        &self,
        entries: &mut [CatalogEntry],
        cancel: &CancellationToken,
    ) -> Result<Vec<ImageFailure>> {
        let total = entries.len();
        let ids: Vec<String> = entries.iter().map(|e| e.external_id.clone()).collect();
        let source = &self.source;

        let mut tracker = ProgressTracker::new(total, ProgressTracker::interval_for(total));
        let mut failures = Vec::new();

        let results = stream::iter(ids.iter().enumerate())
            .map(|(index, id)| async move { (index, source.fetch_image(id).await) })
            .buffer_unordered(self.options.image_concurrency.max(1))
            .take_until(cancel.cancelled());
        tokio::pin!(results);

        while let Some((index, result)) = results.next().await {
            match result {
                Ok(bytes) => {
                    entries[index].poster_image = Some(bytes);
                    tracker.record_succeeded();
                }
                Err(err) => {
                    warn!(id = %ids[index], error = %err, "Failed to fetch poster");
                    tracker.record_failed(failure_category(&err));
                    failures.push(ImageFailure {
                        external_id: ids[index].clone(),
                        message: err.message().to_string(),
                    });
                }
            }
            tracker.log_progress();
            self.report(SyncProgress::PosterFetched {
                done: tracker.processed(),
                total,
            });
        }

        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        tracker.log_summary("Poster fetch");
        Ok(failures)
    }
}

fn failure_category(err: &SourceError) -> &'static str {
    match err.kind() {
        SourceErrorKind::Status(404) => "not found",
        SourceErrorKind::Status(_) => "bad status",
        SourceErrorKind::Timeout => "timeout",
        SourceErrorKind::Other => "request failed",
    }
}
