use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::omdb::MovieDetails;
use crate::AppState;

/// Enriched details for one movie, fetched live from the metadata API
///
/// Nothing is cached; every open of the detail view lands here again.
/// A provider miss and a transport failure surface as different errors.
pub async fn movie_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MovieDetails>> {
    let record = state.store.get(id).await?;

    let details = state.omdb.lookup(&record.name, Some(record.year)).await?;

    Ok(Json(details))
}
