use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::error::{ApiError, ApiResult};
use super::types::*;
use crate::catalog::{Movie, MoviePage};
use crate::db::MovieId;
use crate::server::AppState;

/// Queries this short return nothing instead of hitting the catalog.
const MIN_SEARCH_LEN: usize = 3;

pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> ApiResult<Json<MoviePage>> {
    let page = params.page.unwrap_or(1);
    state
        .catalog
        .popular(page)
        .await
        .map(Json)
        .map_err(|e| ApiError::catalog("Failed to load movies. Please try again later.", e))
}

pub async fn trending(State(state): State<AppState>) -> ApiResult<Json<MoviePage>> {
    state
        .catalog
        .trending()
        .await
        .map(Json)
        .map_err(|e| ApiError::catalog("Failed to load trending movies. Please try again later.", e))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Movie>>> {
    let query = params.query.trim();
    if query.chars().count() < MIN_SEARCH_LEN {
        return Ok(Json(Vec::new()));
    }

    let page = state
        .catalog
        .search(query)
        .await
        .map_err(|e| ApiError::catalog("Failed to search movies.", e))?;

    let mut results = page.results;
    results.truncate(state.config.catalog.search_limit);
    Ok(Json(results))
}

pub async fn movie_details(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
) -> ApiResult<Json<Movie>> {
    state
        .catalog
        .movie(movie_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::catalog("Failed to load movie.", e))
}
