use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::constants::{ERR_EMPTY_NAME, ERR_INVALID_YEAR};
use crate::error::{AppError, Result};
use crate::feed::{start_feed, FeedEvent};
use crate::models::movie::{normalize_name, validate_year};
use crate::models::MovieRecord;
use crate::routes::validation::{require_owner, timestamp_to_rfc3339};
use crate::AppState;

/// Movie as rendered to clients
#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub id: String,
    pub name: String,
    pub year: i32,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl From<MovieRecord> for MovieResponse {
    fn from(record: MovieRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            year: record.year,
            created_at: timestamp_to_rfc3339(record.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListMoviesParams {
    pub search: Option<String>,
    /// Bypass the snapshot cache and stream from the store
    pub refresh: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ListMoviesResponse {
    pub movies: Vec<MovieResponse>,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct AddMovieRequest {
    pub name: String,
    pub year: i32,
}

#[derive(Debug, Serialize)]
pub struct AddMovieResponse {
    pub success: bool,
    pub movie: MovieResponse,
}

#[derive(Debug, Serialize)]
pub struct DeleteMovieResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct MovieCountResponse {
    pub count: i64,
}

/// List the collection, newest first
///
/// Drives one feed pass: cached replay when a fresh snapshot exists and
/// `refresh` is unset, a live batch otherwise. An optional search term
/// filters by case-insensitive substring on the name.
pub async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<ListMoviesParams>,
) -> Result<Json<ListMoviesResponse>> {
    let force_refresh = params.refresh.unwrap_or(false);
    let (mut events, mut handle) =
        start_feed(state.store.clone(), state.cache.clone(), force_refresh);

    let mut movies: Vec<MovieRecord> = Vec::new();
    loop {
        match events.recv().await {
            Some(FeedEvent::Item(movie)) => movies.push(movie),
            Some(FeedEvent::Synced) => break,
            Some(FeedEvent::Failed(e)) => {
                handle.cancel();
                return Err(e);
            }
            None => break,
        }
    }
    // One batch is all a request needs
    handle.cancel();

    movies.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    if let Some(search) = params.search.as_deref() {
        let needle = search.to_lowercase();
        movies.retain(|m| m.name_lower.contains(&needle));
    }

    let count = state.store.count().await?;

    Ok(Json(ListMoviesResponse {
        movies: movies.into_iter().map(MovieResponse::from).collect(),
        count,
    }))
}

/// Current value of the movie counter
pub async fn movie_count(State(state): State<AppState>) -> Result<Json<MovieCountResponse>> {
    let count = state.store.count().await?;
    Ok(Json(MovieCountResponse { count }))
}

/// Add a movie to the list (owner only)
///
/// The name is trimmed and title-cased before storage; the uniqueness
/// check runs against the lowercase form paired with the year.
pub async fn add_movie(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddMovieRequest>,
) -> Result<Json<AddMovieResponse>> {
    require_owner(&state, &headers).await?;

    // 1. Validate before touching the store
    let name = normalize_name(&payload.name)
        .ok_or_else(|| AppError::InvalidInput(ERR_EMPTY_NAME.to_string()))?;

    if !validate_year(payload.year) {
        return Err(AppError::InvalidInput(ERR_INVALID_YEAR.to_string()));
    }

    // 2. Uniqueness check on (nameLower, year); a concurrent add can slip
    // between this query and the commit below
    if state
        .store
        .exists(name.to_lowercase(), payload.year)
        .await?
    {
        return Err(AppError::MovieAlreadyExists);
    }

    // 3. Commit: counter ensured, record inserted, counter bumped, one
    // transaction
    let record = state.store.add(name, payload.year).await?;

    Ok(Json(AddMovieResponse {
        success: true,
        movie: record.into(),
    }))
}

/// Remove a movie by identifier (owner only)
///
/// The record removal and the counter decrement are two separate store
/// operations. The snapshot cache is cleared so the next plain load
/// streams fresh data.
pub async fn delete_movie(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeleteMovieResponse>> {
    require_owner(&state, &headers).await?;

    state.store.delete(id).await?;
    state.cache.clear();

    Ok(Json(DeleteMovieResponse { success: true }))
}
