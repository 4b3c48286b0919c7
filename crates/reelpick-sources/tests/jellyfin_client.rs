//! Drives the Jellyfin adapter against an in-process fake server

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use reelpick_config::JellyfinConfig;
use reelpick_sources::{CatalogSource, JellyfinClient, JellyfinCredentials, SourceErrorKind};
use serde_json::{json, Value};
use std::collections::HashMap;

async fn authenticate(headers: HeaderMap, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !auth.starts_with("MediaBrowser Client=\"reelpick\"") {
        return Err(StatusCode::BAD_REQUEST);
    }
    if body["Username"] != "elliott" || body["Pw"] != "hunter2" {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({ "User": { "Id": "user-1" }, "AccessToken": "session-token" })))
}

async fn items(
    Path(user_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if user_id != "user-1" || !auth.contains("Token=\"session-token\"") {
        return Err(StatusCode::UNAUTHORIZED);
    }

    match params.get("ParentId").map(String::as_str) {
        None => Ok(Json(json!({ "Items": [
            { "Id": "shows", "Name": "Shows", "CollectionType": "tvshows" },
            { "Id": "movies-folder", "Name": "Movies", "CollectionType": "movies" }
        ]}))),
        Some("movies-folder") => Ok(Json(json!({ "Items": [
            { "Id": "m1", "Name": "Lady Bird", "Type": "Movie", "ProductionYear": 2017, "CommunityRating": 7.4 },
            { "Id": "m2", "Name": "Stalker", "Type": "Movie" },
            { "Id": "b1", "Name": "Box Set", "Type": "BoxSet" }
        ], "TotalRecordCount": 3 }))),
        Some(_) => Err(StatusCode::NOT_FOUND),
    }
}

async fn primary_image(Path(item_id): Path<String>) -> Result<Vec<u8>, StatusCode> {
    match item_id.as_str() {
        "m1" => Ok(b"poster-m1".to_vec()),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn spawn_fake_jellyfin() -> String {
    let app = Router::new()
        .route("/Users/AuthenticateByName", post(authenticate))
        .route("/Users/:user_id/Items", get(items))
        .route("/Items/:item_id/Images/Primary", get(primary_image));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(url: String, password: &str) -> JellyfinClient {
    let config = JellyfinConfig::new(url);
    let credentials = JellyfinCredentials {
        username: "elliott".to_string(),
        password: password.to_string(),
        device_token: None,
    };
    JellyfinClient::new(&config, credentials).unwrap()
}

#[tokio::test]
async fn test_full_catalog_fetch() {
    let url = spawn_fake_jellyfin().await;
    let client = client(url, "hunter2");

    client.authenticate().await.unwrap();
    assert!(client.is_authenticated().await);

    let folder = client.library_folder_id("Movies").await.unwrap();
    assert_eq!(folder, "movies-folder");

    let entries = client.fetch_all(&folder).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].title, "Lady Bird");
    assert_eq!(entries[0].release_year, 2017);
    assert_eq!(entries[0].community_rating, Some(7.4));
    assert_eq!(entries[1].release_year, 0);

    assert_eq!(client.fetch_image("m1").await.unwrap(), b"poster-m1".to_vec());
    let err = client.fetch_image("m2").await.unwrap_err();
    assert_eq!(err.kind(), SourceErrorKind::Status(404));
}

#[tokio::test]
async fn test_bad_credentials() {
    let url = spawn_fake_jellyfin().await;
    let client = client(url, "wrong");

    let err = client.authenticate().await.unwrap_err();
    assert_eq!(err.source_name(), "jellyfin");
    assert!(err.message().contains("401"));
    assert_eq!(err.kind(), SourceErrorKind::Status(401));
    assert!(!client.is_authenticated().await);
}

#[tokio::test]
async fn test_calls_before_authentication_fail() {
    let url = spawn_fake_jellyfin().await;
    let client = client(url, "hunter2");

    let err = client.library_folder_id("Movies").await.unwrap_err();
    assert!(err.message().contains("Not authenticated"));
}

#[tokio::test]
async fn test_unknown_library() {
    let url = spawn_fake_jellyfin().await;
    let client = client(url, "hunter2");
    client.authenticate().await.unwrap();

    assert!(client.library_folder_id("Documentaries").await.is_err());
    assert!(client.library_folder_id("Shows").await.is_err());
}
