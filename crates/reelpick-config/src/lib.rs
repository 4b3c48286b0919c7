pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, DatabaseConfig, JellyfinConfig, ServerConfig, SyncConfig, WatchlistConfig};
pub use credentials::CredentialStore;
pub use paths::{container_base_path, PathManager};
