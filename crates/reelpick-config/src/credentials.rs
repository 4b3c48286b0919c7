use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Secrets kept apart from `config.toml` so the config can be shared
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    /// Stored value first, then the named environment variable
    fn get_or_env(&self, key: &str, env_key: &str) -> Option<String> {
        self.get(key)
            .cloned()
            .or_else(|| std::env::var(env_key).ok().filter(|v| !v.is_empty()))
    }

    pub fn get_jellyfin_username(&self) -> Option<String> {
        self.get_or_env("jellyfin_username", "JELLYFIN_USERNAME")
    }

    pub fn set_jellyfin_username(&mut self, username: String) {
        self.set("jellyfin_username".to_string(), username);
    }

    pub fn get_jellyfin_password(&self) -> Option<String> {
        self.get_or_env("jellyfin_password", "JELLYFIN_PASSWORD")
    }

    pub fn set_jellyfin_password(&mut self, password: String) {
        self.set("jellyfin_password".to_string(), password);
    }

    /// Device token sent in the MediaBrowser authorization header
    pub fn get_jellyfin_device_token(&self) -> Option<String> {
        self.get_or_env("jellyfin_device_token", "JELLYFIN_DEVICE_TOKEN")
    }

    pub fn set_jellyfin_device_token(&mut self, token: String) {
        self.set("jellyfin_device_token".to_string(), token);
    }

    pub fn get_all_keys(&self) -> Vec<String> {
        self.credentials.keys().cloned().collect()
    }
}
