use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    Json,
};
use tracing::info;

use super::auth::CurrentUser;
use super::error::{ApiError, ApiResult};
use super::types::*;
use crate::db::{AddOutcome, MovieId, WatchedEntry, WatchedRepo};
use crate::server::AppState;
use crate::share;

pub async fn list_watched(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<FilterQuery>,
) -> ApiResult<Json<WatchedListResponse>> {
    let mut movies = state
        .db
        .list_watched(&user.id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch watched movies", e))?;

    if let Some(filter) = params.filter.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        let filter = filter.to_lowercase();
        movies.retain(|m| m.title.to_lowercase().contains(&filter));
    }

    Ok(Json(WatchedListResponse {
        watched_movies: movies,
    }))
}

pub async fn add_watched(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<AddWatchedRequest>,
) -> ApiResult<Json<AddWatchedResponse>> {
    let (title, poster_path) = match req.title.filter(|t| !t.trim().is_empty()) {
        Some(title) => (title, req.poster_path.unwrap_or_default()),
        None => {
            let movie = state
                .catalog
                .movie(req.movie_id)
                .await
                .map_err(|e| ApiError::catalog("Failed to add movie to watched list", e))?;
            let poster = req
                .poster_path
                .unwrap_or_else(|| movie.poster_path_or_empty().to_string());
            (movie.title, poster)
        }
    };

    let outcome = state
        .db
        .add_watched(&user.id, req.movie_id, &title, &poster_path)
        .await
        .map_err(|e| ApiError::internal("Failed to add movie to watched list", e))?;

    if outcome == AddOutcome::Inserted {
        info!(user = %user.id, movie_id = req.movie_id, "added to watched list");
    }

    // Return the stored entry; on a repeat add that is the original one.
    let entry = state
        .db
        .list_watched(&user.id)
        .await
        .map_err(|e| ApiError::internal("Failed to add movie to watched list", e))?
        .into_iter()
        .find(|e| e.movie_id == req.movie_id)
        .ok_or_else(|| ApiError::Internal("Failed to add movie to watched list".to_string()))?;

    Ok(Json(AddWatchedResponse {
        added: outcome == AddOutcome::Inserted,
        entry,
    }))
}

pub async fn watched_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(movie_id): Path<MovieId>,
) -> ApiResult<Json<WatchedStatus>> {
    let watched = state
        .db
        .is_watched(&user.id, movie_id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch watched movies", e))?;
    Ok(Json(WatchedStatus { movie_id, watched }))
}

pub async fn remove_watched(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(movie_id): Path<MovieId>,
) -> ApiResult<Json<RemoveWatchedResponse>> {
    let removed = state
        .db
        .remove_watched(&user.id, movie_id)
        .await
        .map_err(|e| ApiError::internal("Failed to remove movie from watched list", e))?;

    if removed {
        info!(user = %user.id, movie_id, "removed from watched list");
    }
    Ok(Json(RemoveWatchedResponse { removed }))
}

pub async fn share_link(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
) -> ApiResult<Json<ShareLinkResponse>> {
    let mut movies = state
        .db
        .list_watched(&user.id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch watched movies", e))?;
    sort_for_sharing(&mut movies);

    let token = share::encode(&movies);
    let origin = match state.config.public_url {
        Some(ref url) => url.clone(),
        None => {
            let host = headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| ApiError::BadRequest("missing Host header".to_string()))?;
            let scheme = if state.config.listen.tlscert.is_some() {
                "https"
            } else {
                "http"
            };
            format!("{}://{}", scheme, host)
        }
    };

    Ok(Json(ShareLinkResponse {
        url: share::share_url(&origin, &token),
        token,
    }))
}

/// The store has no order; share oldest first so the token is stable.
fn sort_for_sharing(movies: &mut [WatchedEntry]) {
    movies.sort_by(|a, b| {
        a.added_at
            .cmp(&b.added_at)
            .then(a.movie_id.cmp(&b.movie_id))
    });
}
