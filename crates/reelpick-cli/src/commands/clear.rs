use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use reelpick_config::{Config, PathManager};
use reelpick_core::{CatalogStore, PairingStore, SqliteStore};
use std::fs;
use std::path::PathBuf;

pub async fn run_clear(pairs: bool, catalog: bool, all: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();

    if !(pairs || catalog || all) {
        output.warn("No clear option specified. Use --pairs, --catalog, or --all");
        output.println("\nExample: reelpick clear --pairs");
        return Ok(());
    }

    let db_path = database_path(&path_manager);
    match open_existing(&db_path).await? {
        Some(store) => {
            if all || catalog {
                CatalogStore::clear(&store).await.wrap_err("Failed to clear the catalog")?;
                output.success("Cleared the catalog and every watchlist pair");
            } else {
                PairingStore::clear(&store).await.wrap_err("Failed to clear watchlist pairs")?;
                output.success("Cleared watchlist pairs");
            }
            store.close().await;
        }
        None => output.info(format!("No database found at {}", db_path.display())),
    }

    if all {
        clear_credentials(&path_manager, output)?;
    }
    Ok(())
}

/// The configured database, or the default location when no config loads
fn database_path(path_manager: &PathManager) -> PathBuf {
    match Config::load(path_manager) {
        Ok(config) => config.database_path(path_manager),
        Err(e) => {
            tracing::debug!(error = %e, "No usable config, assuming the default database path");
            path_manager.database_file()
        }
    }
}

async fn open_existing(db_path: &std::path::Path) -> Result<Option<SqliteStore>> {
    if !db_path.exists() {
        return Ok(None);
    }
    let store = SqliteStore::connect(db_path, 1)
        .await
        .wrap_err_with(|| format!("Failed to open database at {}", db_path.display()))?;
    Ok(Some(store))
}

fn clear_credentials(path_manager: &PathManager, output: &Output) -> Result<()> {
    let credentials_file = path_manager.credentials_file();

    if credentials_file.exists() {
        fs::remove_file(&credentials_file).map_err(|e| {
            color_eyre::eyre::eyre!(
                "Failed to remove credentials file at {}: {}",
                credentials_file.display(),
                e
            )
        })?;
        output.success(format!("Cleared credentials: {}", credentials_file.display()));
    } else {
        output.info("No credentials file found to clear");
    }
    Ok(())
}
