use anyhow::Result;
use async_trait::async_trait;
use reelpick_config::JellyfinConfig;
use reelpick_models::CatalogEntry;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::jellyfin::api::{BaseItem, JellyfinHttpClient};
use crate::traits::CatalogSource;
use crate::SourceError;

const SOURCE_NAME: &str = "jellyfin";

#[derive(Debug, Clone)]
pub struct JellyfinCredentials {
    pub username: String,
    pub password: String,
    /// Pre-registered device token, sent during the handshake when present
    pub device_token: Option<String>,
}

#[derive(Debug, Clone)]
struct Session {
    user_id: String,
    access_token: Option<String>,
}

pub struct JellyfinClient {
    api: JellyfinHttpClient,
    credentials: JellyfinCredentials,
    session: RwLock<Option<Session>>,
}

impl JellyfinClient {
    pub fn new(config: &JellyfinConfig, credentials: JellyfinCredentials) -> Result<Self> {
        Ok(Self {
            api: JellyfinHttpClient::new(config)?,
            credentials,
            session: RwLock::new(None),
        })
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    async fn session(&self) -> Result<Session> {
        self.session
            .read()
            .await
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Not authenticated to Jellyfin"))
    }

    fn error(err: anyhow::Error) -> SourceError {
        SourceError::from_anyhow(SOURCE_NAME, err)
    }
}

impl Session {
    fn token<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        self.access_token.as_deref().or(fallback)
    }
}

/// Pick the library view by name, rejecting views that are not movie libraries
pub(crate) fn select_library(views: &[BaseItem], library_name: &str) -> Result<String> {
    let view = views
        .iter()
        .find(|v| v.name.as_deref() == Some(library_name))
        .ok_or_else(|| anyhow::anyhow!("Unable to find the '{}' library", library_name))?;

    if let Some(collection_type) = view.collection_type.as_deref() {
        if !collection_type.eq_ignore_ascii_case("movies") {
            return Err(anyhow::anyhow!(
                "Library '{}' has collection type '{}', expected 'movies'",
                library_name,
                collection_type
            ));
        }
    }

    view.id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Library '{}' has no id", library_name))
}

/// Map a listed item to a catalog entry. Items that are not movies or lack an id or name yield `None`.
pub(crate) fn to_catalog_entry(item: BaseItem) -> Option<CatalogEntry> {
    if item.item_type.as_deref() != Some("Movie") {
        return None;
    }
    let id = item.id.filter(|id| !id.is_empty())?;
    let name = item.name?;

    let mut entry = CatalogEntry::new(id, name, item.production_year.unwrap_or(0));
    entry.community_rating = item.community_rating;
    Some(entry)
}

#[async_trait]
impl CatalogSource for JellyfinClient {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    async fn authenticate(&self) -> Result<(), SourceError> {
        let auth = self
            .api
            .authenticate_by_name(
                &self.credentials.username,
                &self.credentials.password,
                self.credentials.device_token.as_deref(),
            )
            .await
            .map_err(Self::error)?;

        *self.session.write().await = Some(Session {
            user_id: auth.user.id,
            access_token: auth.access_token,
        });

        info!("Authenticated to Jellyfin at {}", self.api.base_url());
        Ok(())
    }

    async fn library_folder_id(&self, library_name: &str) -> Result<String, SourceError> {
        let session = self.session().await.map_err(Self::error)?;
        let token = session.token(self.credentials.device_token.as_deref());

        let views = self.api.get_views(&session.user_id, token).await.map_err(Self::error)?;
        let id = select_library(&views, library_name).map_err(Self::error)?;
        debug!(library = library_name, folder_id = %id, "Resolved library folder");
        Ok(id)
    }

    async fn fetch_all(&self, parent_folder_id: &str) -> Result<Vec<CatalogEntry>, SourceError> {
        let session = self.session().await.map_err(Self::error)?;
        let token = session.token(self.credentials.device_token.as_deref());

        let items = self
            .api
            .get_movies(&session.user_id, parent_folder_id, token)
            .await
            .map_err(Self::error)?;

        let listed = items.len();
        let entries: Vec<CatalogEntry> = items.into_iter().filter_map(to_catalog_entry).collect();
        if entries.len() < listed {
            debug!("Skipped {} non-movie or incomplete items", listed - entries.len());
        }
        info!("Fetched {} movies from Jellyfin", entries.len());
        Ok(entries)
    }

    async fn fetch_image(&self, external_id: &str) -> Result<Vec<u8>, SourceError> {
        let session = self.session().await.map_err(Self::error)?;
        let token = session.token(self.credentials.device_token.as_deref());

        self.api
            .get_primary_image(external_id, token)
            .await
            .map_err(Self::error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: &str, name: &str, collection_type: Option<&str>) -> BaseItem {
        BaseItem {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            collection_type: collection_type.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_select_library_by_name() {
        let views = vec![
            view("tv", "Shows", Some("tvshows")),
            view("mv", "Movies", Some("movies")),
        ];
        assert_eq!(select_library(&views, "Movies").unwrap(), "mv");
    }

    #[test]
    fn test_select_library_rejects_wrong_type() {
        let views = vec![view("mv", "Movies", Some("tvshows"))];
        let err = select_library(&views, "Movies").unwrap_err();
        assert!(err.to_string().contains("expected 'movies'"));
    }

    #[test]
    fn test_select_library_missing() {
        let views = vec![view("tv", "Shows", None)];
        assert!(select_library(&views, "Movies").is_err());
    }

    #[test]
    fn test_to_catalog_entry_skips_incomplete_items() {
        let movie = BaseItem {
            id: Some("a1".to_string()),
            name: Some("Columbus".to_string()),
            item_type: Some("Movie".to_string()),
            production_year: Some(2017),
            community_rating: Some(7.2),
            ..Default::default()
        };
        let entry = to_catalog_entry(movie.clone()).unwrap();
        assert_eq!(entry.external_id, "a1");
        assert_eq!(entry.release_year, 2017);
        assert_eq!(entry.community_rating, Some(7.2));

        let no_year = BaseItem { production_year: None, ..movie.clone() };
        assert_eq!(to_catalog_entry(no_year).unwrap().release_year, 0);

        let folder = BaseItem { item_type: Some("Folder".to_string()), ..movie.clone() };
        assert!(to_catalog_entry(folder).is_none());

        let no_id = BaseItem { id: None, ..movie };
        assert!(to_catalog_entry(no_id).is_none());
    }
}
