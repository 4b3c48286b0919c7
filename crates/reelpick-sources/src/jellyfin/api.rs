use anyhow::{Context, Result};
use reelpick_config::JellyfinConfig;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::HttpStatusError;

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "Pw")]
    password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "User")]
    pub user: AuthUser,
    #[serde(rename = "AccessToken")]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    #[serde(rename = "Id")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    #[serde(rename = "Items", default)]
    items: Vec<BaseItem>,
}

/// The subset of Jellyfin's `BaseItemDto` this client reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaseItem {
    #[serde(rename = "Id")]
    pub id: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub item_type: Option<String>,
    #[serde(rename = "CollectionType")]
    pub collection_type: Option<String>,
    #[serde(rename = "ProductionYear")]
    pub production_year: Option<u32>,
    #[serde(rename = "CommunityRating")]
    pub community_rating: Option<f32>,
}

pub struct JellyfinHttpClient {
    client: Client,
    base_url: String,
    client_name: String,
    device_name: String,
    device_id: String,
    version: String,
    image_max_width: u32,
    image_max_height: u32,
}

impl JellyfinHttpClient {
    pub fn new(config: &JellyfinConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            client_name: config.client_name.clone(),
            device_name: config.device_name.clone(),
            device_id: config.device_id.clone(),
            version: config.client_version.clone(),
            image_max_width: config.image_max_width,
            image_max_height: config.image_max_height,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Value of the `Authorization` header Jellyfin expects from clients
    pub fn media_browser_header(&self, token: Option<&str>) -> String {
        let mut header = format!(
            "MediaBrowser Client=\"{}\", Device=\"{}\", DeviceId=\"{}\", Version=\"{}\"",
            self.client_name, self.device_name, self.device_id, self.version
        );
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            header.push_str(&format!(", Token=\"{}\"", token));
        }
        header
    }

    fn authorized(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, self.media_browser_header(token))
    }

    async fn check_status(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(HttpStatusError {
            what: what.to_string(),
            status,
            body: body.chars().take(200).collect(),
        }
        .into())
    }

    pub async fn authenticate_by_name(
        &self,
        username: &str,
        password: &str,
        device_token: Option<&str>,
    ) -> Result<AuthResponse> {
        let url = format!("{}/Users/AuthenticateByName", self.base_url);
        let response = self
            .authorized(self.client.post(&url), device_token)
            .json(&AuthRequest { username, password })
            .send()
            .await
            .context("Failed to reach Jellyfin for authentication")?;

        let response = Self::check_status(response, "Jellyfin authentication").await?;
        let auth: AuthResponse = response
            .json()
            .await
            .context("Failed to parse authentication response")?;

        debug!(user_id = %auth.user.id, "Jellyfin authentication successful");
        Ok(auth)
    }

    /// Top-level views (libraries) visible to the user
    pub async fn get_views(&self, user_id: &str, token: Option<&str>) -> Result<Vec<BaseItem>> {
        let url = format!("{}/Users/{}/Items", self.base_url, user_id);
        let response = self
            .authorized(self.client.get(&url), token)
            .send()
            .await
            .context("Failed to list Jellyfin views")?;

        let response = Self::check_status(response, "Listing views").await?;
        let items: ItemsResponse = response
            .json()
            .await
            .context("Failed to parse views response")?;
        Ok(items.items)
    }

    pub async fn get_movies(&self, user_id: &str, parent_id: &str, token: Option<&str>) -> Result<Vec<BaseItem>> {
        let url = format!("{}/Users/{}/Items", self.base_url, user_id);
        let response = self
            .authorized(self.client.get(&url), token)
            .query(&[
                ("ParentId", parent_id),
                ("IncludeItemTypes", "Movie"),
                ("Recursive", "true"),
                ("Fields", "ProductionYear,CommunityRating"),
            ])
            .send()
            .await
            .context("Failed to list Jellyfin movies")?;

        let response = Self::check_status(response, "Listing movies").await?;
        let items: ItemsResponse = response
            .json()
            .await
            .context("Failed to parse movies response")?;
        Ok(items.items)
    }

    pub async fn get_primary_image(&self, item_id: &str, token: Option<&str>) -> Result<Vec<u8>> {
        let url = format!("{}/Items/{}/Images/Primary", self.base_url, item_id);
        let response = self
            .authorized(self.client.get(&url), token)
            .query(&[
                ("MaxWidth", self.image_max_width),
                ("MaxHeight", self.image_max_height),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to request poster for {}", item_id))?;

        let response = Self::check_status(response, "Poster download").await?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read poster bytes for {}", item_id))?;
        Ok(bytes.to_vec())
    }
}
