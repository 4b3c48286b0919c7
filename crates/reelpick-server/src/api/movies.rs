use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use reelpick_models::{Pool, ResolvedItem};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PickQuery {
    /// Kept as text so a malformed value gets the API's own 400 body
    count: Option<String>,
}

impl PickQuery {
    fn count(&self, default_count: usize, max_count: usize) -> ApiResult<usize> {
        let count = match self.count.as_deref().map(str::trim) {
            None | Some("") => default_count,
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| ApiError::BadRequest(format!("count must be a positive integer, got '{}'", raw)))?,
        };
        if count > max_count {
            return Err(ApiError::BadRequest(format!("count must be at most {}", max_count)));
        }
        Ok(count)
    }
}

async fn pick(state: &AppState, pool: Pool, query: &PickQuery) -> ApiResult<Json<Vec<ResolvedItem>>> {
    let count = query.count(state.default_count, state.max_count)?;
    let items = state.selector.pick(pool, count).await?;
    debug!(%pool, count = items.len(), "Served random pick");
    Ok(Json(items))
}

/// GET /movies/random
pub async fn random_movies(
    State(state): State<AppState>,
    Query(query): Query<PickQuery>,
) -> ApiResult<Json<Vec<ResolvedItem>>> {
    pick(&state, Pool::Catalog, &query).await
}

/// GET /movies/watchlist/random
pub async fn random_watchlist_movies(
    State(state): State<AppState>,
    Query(query): Query<PickQuery>,
) -> ApiResult<Json<Vec<ResolvedItem>>> {
    pick(&state, Pool::Watchlist, &query).await
}

pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/movies/random", get(random_movies))
        .route("/movies/watchlist/random", get(random_watchlist_movies))
}
