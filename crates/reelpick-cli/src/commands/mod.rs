pub mod clear;
pub mod config;
pub mod pick;
pub mod prompts;
pub mod serve;
pub mod sync;
pub mod sync_ui;

use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use reelpick_config::{Config, CredentialStore, PathManager};
use reelpick_core::{RandomSelector, SqliteStore};
use reelpick_sources::{JellyfinClient, JellyfinCredentials, LetterboxdWatchlist};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Loaded configuration plus the open database, shared by the commands
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
    pub store: Arc<SqliteStore>,
}

impl AppContext {
    pub async fn open() -> Result<Self> {
        let paths = PathManager::default();
        let config = Config::load(&paths).map_err(|e| eyre!("{:#}", e))?;

        let db_path = config.database_path(&paths);
        let store = SqliteStore::connect(&db_path, config.database.max_connections)
            .await
            .wrap_err_with(|| format!("Failed to open database at {}", db_path.display()))?;

        Ok(Self {
            paths,
            config,
            store: Arc::new(store),
        })
    }

    pub fn jellyfin_credentials(&self) -> Result<JellyfinCredentials> {
        let credentials_file = self.paths.credentials_file();
        let mut cred_store = CredentialStore::new(credentials_file.clone());
        cred_store
            .load()
            .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;

        let username = cred_store
            .get_jellyfin_username()
            .ok_or_else(|| eyre!("No Jellyfin username configured. Run 'reelpick config jellyfin' or set JELLYFIN_USERNAME"))?;
        let password = cred_store
            .get_jellyfin_password()
            .ok_or_else(|| eyre!("No Jellyfin password configured. Run 'reelpick config jellyfin' or set JELLYFIN_PASSWORD"))?;

        Ok(JellyfinCredentials {
            username,
            password,
            device_token: cred_store.get_jellyfin_device_token(),
        })
    }

    pub fn catalog_source(&self) -> Result<Arc<JellyfinClient>> {
        let client = JellyfinClient::new(&self.config.jellyfin, self.jellyfin_credentials()?)
            .map_err(|e| eyre!("Failed to create Jellyfin client: {:#}", e))?;
        Ok(Arc::new(client))
    }

    pub fn watchlist_source(&self) -> Arc<LetterboxdWatchlist> {
        Arc::new(LetterboxdWatchlist::new(self.config.watchlist_csv_path(&self.paths)))
    }

    pub fn selector(&self) -> RandomSelector {
        RandomSelector::new(self.store.clone(), self.store.clone())
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.config.sync.startup_timeout_secs)
    }
}

/// Cancels its token on Ctrl-C or once the deadline passes.
///
/// Dropping it stops watching, so work started afterwards is unaffected.
pub struct StartupCancel {
    token: CancellationToken,
    watcher: JoinHandle<()>,
}

impl StartupCancel {
    pub fn start(deadline: Duration) -> Self {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let watcher = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => warn!("Interrupted, cancelling startup work"),
                _ = tokio::time::sleep(deadline) => {
                    warn!(timeout_secs = deadline.as_secs(), "Startup deadline elapsed, cancelling");
                }
            }
            trigger.cancel();
        });
        Self { token, watcher }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for StartupCancel {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}
