use async_trait::async_trait;
use reelpick_models::WatchlistEntry;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::letterboxd::parser::parse_watchlist;
use crate::traits::WatchlistSource;
use crate::SourceError;

const SOURCE_NAME: &str = "letterboxd";

/// Watchlist backed by a Letterboxd CSV export on disk
pub struct LetterboxdWatchlist {
    path: PathBuf,
}

impl LetterboxdWatchlist {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl WatchlistSource for LetterboxdWatchlist {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    async fn load(&self) -> Result<Vec<WatchlistEntry>, SourceError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            SourceError::new(
                SOURCE_NAME,
                format!("Failed to read watchlist CSV {}: {}", self.path.display(), e),
            )
        })?;

        let parsed = parse_watchlist(bytes.as_slice()).map_err(|e| SourceError::from_anyhow(SOURCE_NAME, e))?;
        info!(
            "Loaded {} watchlist entries from {} ({} skipped)",
            parsed.entries.len(),
            self.path.display(),
            parsed.skipped.len()
        );
        Ok(parsed.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Date,Name,Year,Letterboxd URI").unwrap();
        writeln!(file, "2020-04-26,Lady Bird,2017,https://boxd.it/dGNE").unwrap();

        let source = LetterboxdWatchlist::new(file.path().to_path_buf());
        let entries = source.load().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Lady Bird");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let source = LetterboxdWatchlist::new(PathBuf::from("/nonexistent/watchlist.csv"));
        let err = source.load().await.unwrap_err();
        assert_eq!(err.source_name(), "letterboxd");
        assert!(err.message().contains("/nonexistent/watchlist.csv"));
    }
}
