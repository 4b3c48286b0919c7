use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::PathManager;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub jellyfin: JellyfinConfig,
    #[serde(default)]
    pub watchlist: WatchlistConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JellyfinConfig {
    pub server_url: String,
    /// Name of the top-level library view holding the movies
    #[serde(default = "default_library_name")]
    pub library_name: String,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default = "default_device_name")]
    pub device_name: String,
    #[serde(default = "default_device_id")]
    pub device_id: String,
    #[serde(default = "default_client_version")]
    pub client_version: String,
    #[serde(default = "default_image_max_dimension")]
    pub image_max_width: u32,
    #[serde(default = "default_image_max_dimension")]
    pub image_max_height: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WatchlistConfig {
    /// Letterboxd export; falls back to `<config_dir>/resources/watchlist.csv`
    #[serde(default)]
    pub csv_path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// SQLite file; falls back to `<data_dir>/reelpick.db`
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_pick_count")]
    pub default_pick_count: usize,
    #[serde(default = "default_max_pick_count")]
    pub max_pick_count: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub sync_on_startup: bool,
    #[serde(default = "default_true")]
    pub reconcile_on_startup: bool,
    #[serde(default = "default_true")]
    pub fetch_images: bool,
    #[serde(default = "default_image_concurrency")]
    pub image_concurrency: usize,
    /// Deadline for the startup sync and reconciliation passes
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_library_name() -> String {
    "Movies".to_string()
}

fn default_client_name() -> String {
    "reelpick".to_string()
}

fn default_device_name() -> String {
    "reelpick-server".to_string()
}

fn default_device_id() -> String {
    "reelpick".to_string()
}

fn default_client_version() -> String {
    "10.8.8".to_string()
}

fn default_image_max_dimension() -> u32 {
    400
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    5
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_pick_count() -> usize {
    3
}

fn default_max_pick_count() -> usize {
    50
}

fn default_image_concurrency() -> usize {
    4
}

fn default_startup_timeout_secs() -> u64 {
    300 // 5 minutes
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            default_pick_count: default_pick_count(),
            max_pick_count: default_max_pick_count(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_on_startup: default_true(),
            reconcile_on_startup: default_true(),
            fetch_images: default_true(),
            image_concurrency: default_image_concurrency(),
            startup_timeout_secs: default_startup_timeout_secs(),
        }
    }
}

impl JellyfinConfig {
    pub fn new(server_url: String) -> Self {
        Self {
            server_url,
            library_name: default_library_name(),
            client_name: default_client_name(),
            device_name: default_device_name(),
            device_id: default_device_id(),
            client_version: default_client_version(),
            image_max_width: default_image_max_dimension(),
            image_max_height: default_image_max_dimension(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Minimal config pointing at a Jellyfin host, everything else defaulted
    pub fn new(server_url: String) -> Self {
        Self {
            jellyfin: JellyfinConfig::new(server_url),
            watchlist: WatchlistConfig::default(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            sync: SyncConfig::default(),
        }
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load the config file, then layer environment overrides on top.
    ///
    /// A missing config file is fine as long as `JELLYFIN_HOST` supplies the server.
    pub fn load(path_manager: &PathManager) -> anyhow::Result<Self> {
        let path = path_manager.config_file();
        let mut config = if path.exists() {
            Self::load_from_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config from {}: {}", path.display(), e))?
        } else {
            let host = std::env::var("JELLYFIN_HOST").map_err(|_| {
                anyhow::anyhow!(
                    "No config file at {} and JELLYFIN_HOST is not set. Run 'reelpick config init' first",
                    path.display()
                )
            })?;
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::new(host)
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = lookup("JELLYFIN_HOST") {
            self.jellyfin.server_url = host;
        }
        if let Some(device_id) = lookup("JELLYFIN_DEVICE_ID") {
            self.jellyfin.device_id = device_id;
        }
        if let Some(library) = lookup("JELLYFIN_LIBRARY") {
            self.jellyfin.library_name = library;
        }
        if let Some(csv_path) = lookup("WATCHLIST_CSV_PATH") {
            self.watchlist.csv_path = Some(PathBuf::from(csv_path));
        }
        if let Some(db_path) = lookup("REELPICK_DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(db_path));
        }
        if let Some(bind) = lookup("REELPICK_BIND") {
            self.server.bind = bind;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jellyfin.server_url.trim().is_empty() {
            return Err(anyhow::anyhow!("jellyfin.server_url must not be empty"));
        }
        if self.server.default_pick_count == 0 {
            return Err(anyhow::anyhow!("server.default_pick_count must be at least 1"));
        }
        if self.server.default_pick_count > self.server.max_pick_count {
            return Err(anyhow::anyhow!(
                "server.default_pick_count ({}) exceeds server.max_pick_count ({})",
                self.server.default_pick_count,
                self.server.max_pick_count
            ));
        }
        if self.sync.image_concurrency == 0 {
            return Err(anyhow::anyhow!("sync.image_concurrency must be at least 1"));
        }
        Ok(())
    }

    pub fn watchlist_csv_path(&self, path_manager: &PathManager) -> PathBuf {
        self.watchlist
            .csv_path
            .clone()
            .unwrap_or_else(|| path_manager.default_watchlist_csv())
    }

    pub fn database_path(&self, path_manager: &PathManager) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| path_manager.database_file())
    }
}
