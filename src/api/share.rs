use axum::{
    extract::{Query, State},
    Json,
};

use super::error::ApiResult;
use super::types::ShareQuery;
use crate::server::AppState;
use crate::share::{self, SharedList};

/// `GET /api/share?list=<token>`: the movies of a shared watched list.
pub async fn get_shared_list(
    State(state): State<AppState>,
    Query(params): Query<ShareQuery>,
) -> ApiResult<Json<SharedList>> {
    let list = share::resolve(state.catalog.as_ref(), params.list.as_deref()).await?;
    Ok(Json(list))
}
