use axum::{
    extract::{Path, State},
    Json,
};

use super::auth::CurrentUser;
use super::error::{ApiError, ApiResult};
use super::types::PostReviewRequest;
use crate::db::{DbError, MovieId, Review, ReviewRepo};
use crate::server::AppState;

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
) -> ApiResult<Json<Vec<Review>>> {
    state
        .db
        .list_reviews(movie_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to fetch reviews", e))
}

pub async fn post_review(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(movie_id): Path<MovieId>,
    Json(req): Json<PostReviewRequest>,
) -> ApiResult<Json<Review>> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("review is empty".to_string()));
    }
    state
        .db
        .add_review(movie_id, &user.id, &user.username, &req.content)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to add review", e))
}

pub async fn upvote_review(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(review_id): Path<i64>,
) -> ApiResult<Json<Review>> {
    match state.db.upvote_review(review_id).await {
        Ok(review) => Ok(Json(review)),
        Err(DbError::NotFound(msg)) => Err(ApiError::NotFound(msg)),
        Err(e) => Err(ApiError::internal("Failed to upvote review", e)),
    }
}
