use axum::{extract::State, Json};

use super::auth::CurrentUser;
use super::error::{ApiError, ApiResult};
use crate::db::{Preferences, PreferencesRepo};
use crate::server::AppState;

pub async fn get_preferences(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Preferences>> {
    state
        .db
        .get_preferences(&user.id)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to fetch preferences", e))
}

pub async fn set_preferences(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(prefs): Json<Preferences>,
) -> ApiResult<Json<Preferences>> {
    state
        .db
        .set_preferences(&user.id, &prefs)
        .await
        .map_err(|e| ApiError::internal("Failed to save preferences", e))?;
    Ok(Json(prefs))
}
