use async_trait::async_trait;
use chrono::NaiveDate;
use reelpick_models::{CatalogEntry, ReconciledPair};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::{CatalogStore, PairingStore, StoreError};

const CREATE_MOVIE: &str = "
    CREATE TABLE IF NOT EXISTS movie (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        jellyfin_id TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        production_year INTEGER NOT NULL DEFAULT 0,
        community_rating REAL
    )";

const CREATE_MOVIE_IMAGE: &str = "
    CREATE TABLE IF NOT EXISTS movie_image (
        movie_id INTEGER PRIMARY KEY REFERENCES movie(id) ON DELETE CASCADE,
        image_data BLOB NOT NULL
    )";

const CREATE_MOVIE_WATCHLIST: &str = "
    CREATE TABLE IF NOT EXISTS movie_watchlist (
        jellyfin_id TEXT NOT NULL REFERENCES movie(jellyfin_id) ON DELETE CASCADE,
        watchlist_row INTEGER NOT NULL,
        watchlist_title TEXT NOT NULL,
        added_date TEXT,
        PRIMARY KEY (jellyfin_id, watchlist_row)
    )";

/// SQLite-backed catalog and pairing store
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file and make sure the schema exists
    pub async fn connect(db_path: &Path, max_connections: u32) -> Result<Self, StoreError> {
        let newly_created = !db_path.exists();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    /// Private in-memory database, mostly for tests
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // One connection that never expires, or the database vanishes with it
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<(), StoreError> {
        for statement in [CREATE_MOVIE, CREATE_MOVIE_IMAGE, CREATE_MOVIE_WATCHLIST] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Database schema ready");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn u32_from_db(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn entry_from_row(row: &SqliteRow) -> Result<CatalogEntry, sqlx::Error> {
    let rating: Option<f64> = row.try_get("community_rating")?;
    Ok(CatalogEntry {
        external_id: row.try_get("jellyfin_id")?,
        title: row.try_get("title")?,
        release_year: u32_from_db(row.try_get("production_year")?),
        community_rating: rating.map(|r| r as f32),
        poster_image: None,
    })
}

fn pair_from_row(row: &SqliteRow) -> Result<ReconciledPair, sqlx::Error> {
    let watchlist_row: i64 = row.try_get("watchlist_row")?;
    let added_date: Option<NaiveDate> = row.try_get("added_date")?;
    Ok(ReconciledPair {
        catalog_id: row.try_get("jellyfin_id")?,
        watchlist_row: u32_from_db(watchlist_row),
        watchlist_title: row.try_get("watchlist_title")?,
        added_date,
    })
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn upsert_all(&self, entries: &[CatalogEntry]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        let mut images = 0u64;

        for entry in entries {
            let result = sqlx::query(
                "INSERT INTO movie (jellyfin_id, title, production_year, community_rating)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(jellyfin_id) DO NOTHING",
            )
            .bind(&entry.external_id)
            .bind(&entry.title)
            .bind(i64::from(entry.release_year))
            .bind(entry.community_rating.map(f64::from))
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();

            if let Some(image) = &entry.poster_image {
                let result = sqlx::query(
                    "INSERT INTO movie_image (movie_id, image_data)
                     SELECT id, ? FROM movie WHERE jellyfin_id = ?
                     ON CONFLICT(movie_id) DO NOTHING",
                )
                .bind(image.as_slice())
                .bind(&entry.external_id)
                .execute(&mut *tx)
                .await?;
                images += result.rows_affected();
            }
        }

        tx.commit().await?;
        debug!(total = entries.len(), inserted, images, "Catalog upsert committed");
        Ok(())
    }

    async fn random_sample(&self, count: usize) -> Result<Vec<CatalogEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT jellyfin_id, title, production_year, community_rating
             FROM movie ORDER BY RANDOM() LIMIT ?",
        )
        .bind(count as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(entry_from_row).collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    async fn get_by_id(&self, external_id: &str) -> Result<CatalogEntry, StoreError> {
        let row = sqlx::query(
            "SELECT m.jellyfin_id, m.title, m.production_year, m.community_rating, i.image_data
             FROM movie m LEFT JOIN movie_image i ON i.movie_id = m.id
             WHERE m.jellyfin_id = ?",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("movie {}", external_id)))?;

        let mut entry = entry_from_row(&row)?;
        entry.poster_image = row.try_get("image_data")?;
        Ok(entry)
    }

    async fn list_all(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT jellyfin_id, title, production_year, community_rating FROM movie ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(entry_from_row).collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movie")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn ids(&self) -> Result<Vec<String>, StoreError> {
        let ids = sqlx::query_scalar("SELECT jellyfin_id FROM movie ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM movie_watchlist").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM movie_image").execute(&mut *tx).await?;
        let result = sqlx::query("DELETE FROM movie").execute(&mut *tx).await?;
        tx.commit().await?;
        info!("Removed {} catalog entries", result.rows_affected());
        Ok(())
    }
}

#[async_trait]
impl PairingStore for SqliteStore {
    async fn insert_all(&self, pairs: &[ReconciledPair]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let replaced = sqlx::query("DELETE FROM movie_watchlist")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let mut inserted = 0u64;

        for pair in pairs {
            let result = sqlx::query(
                "INSERT INTO movie_watchlist (jellyfin_id, watchlist_row, watchlist_title, added_date)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(jellyfin_id, watchlist_row) DO NOTHING",
            )
            .bind(&pair.catalog_id)
            .bind(i64::from(pair.watchlist_row))
            .bind(&pair.watchlist_title)
            .bind(pair.added_date)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!(total = pairs.len(), inserted, replaced, "Pair set replaced");
        Ok(())
    }

    async fn random_sample(&self, count: usize) -> Result<Vec<ReconciledPair>, StoreError> {
        let rows = sqlx::query(
            "SELECT jellyfin_id, watchlist_row, watchlist_title, added_date
             FROM movie_watchlist ORDER BY RANDOM() LIMIT ?",
        )
        .bind(count as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(pair_from_row).collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    async fn distinct_catalog_count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT jellyfin_id) FROM movie_watchlist")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn distinct_by_catalog(&self) -> Result<Vec<ReconciledPair>, StoreError> {
        let rows = sqlx::query(
            "SELECT w.jellyfin_id, w.watchlist_row, w.watchlist_title, w.added_date
             FROM movie_watchlist w
             JOIN (SELECT jellyfin_id, MIN(watchlist_row) AS first_row
                   FROM movie_watchlist GROUP BY jellyfin_id) f
               ON w.jellyfin_id = f.jellyfin_id AND w.watchlist_row = f.first_row
             ORDER BY w.watchlist_row",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(pair_from_row).collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM movie_watchlist").execute(&self.pool).await?;
        info!("Removed {} reconciled pairs", result.rows_affected());
        Ok(())
    }
}

#[cfg(test)]
mod tests;
