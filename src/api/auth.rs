use axum::{
    async_trait,
    extract::{FromRequestParts, Query, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
    Json,
};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{info, warn};

use super::error::{ApiError, ApiResult};
use super::types::*;
use crate::db::{AccessToken, AccessTokenRepo, DbError, User, UserRepo};
use crate::server::AppState;

/// The authenticated user of a request, attached by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("username is required".to_string()));
    }

    let (mut user, registered) = match state.db.get_user(username).await {
        Ok(user) => (user, false),
        Err(DbError::NotFound(_)) if state.config.auth.autoregister => {
            register(&state, username, &req.password).await?
        }
        Err(DbError::NotFound(_)) => {
            warn!(username = username, "login failed: unknown user");
            return Err(ApiError::Unauthorized);
        }
        Err(e) => return Err(ApiError::internal("Failed to log in", e)),
    };

    if !registered && !bcrypt::verify(&req.password, &user.password).unwrap_or(false) {
        warn!(username = username, "login failed: bad password");
        return Err(ApiError::Unauthorized);
    }

    user.lastlogin = Some(Utc::now());
    state
        .db
        .upsert_user(&user)
        .await
        .map_err(|e| ApiError::internal("Failed to log in", e))?;

    let token = AccessToken {
        token: uuid::Uuid::new_v4().to_string(),
        userid: user.id.clone(),
        created: Some(Utc::now()),
        lastused: None,
    };

    state
        .db
        .upsert_token(&token)
        .await
        .map_err(|e| ApiError::internal("Failed to log in", e))?;

    Ok(Json(LoginResponse {
        access_token: token.token,
        user: UserDto {
            id: user.id,
            name: user.username,
        },
    }))
}

/// Creates the user unless a concurrent login registered the name first.
/// Returns the stored user and whether this call created it.
async fn register(state: &AppState, username: &str, password: &str) -> ApiResult<(User, bool)> {
    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal("Failed to register user", e))?;
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: username.to_string(),
        password: hash,
        created: Some(Utc::now()),
        lastlogin: None,
    };

    let created = state
        .db
        .create_user(&user)
        .await
        .map_err(|e| ApiError::internal("Failed to register user", e))?;
    if created {
        info!(username = username, "registered new user");
        return Ok((user, true));
    }

    let existing = state
        .db
        .get_user(username)
        .await
        .map_err(|e| ApiError::internal("Failed to register user", e))?;
    Ok((existing, false))
}

pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<OkResponse>> {
    state
        .db
        .delete_token(&user.token)
        .await
        .map_err(|e| ApiError::internal("Failed to log out", e))?;
    Ok(Json(OkResponse { ok: true }))
}

pub async fn current_user(user: CurrentUser) -> Json<UserDto> {
    Json(UserDto {
        id: user.id,
        name: user.username,
    })
}

/// Resolves the request's access token, if any, and attaches a [`CurrentUser`].
///
/// Requests without a valid token pass through; handlers that need a user
/// reject them through the `CurrentUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token_str) = extract_token(&req, &params) {
        if let Ok(token) = state.db.get_token(&token_str).await {
            match state.db.get_user_by_id(&token.userid).await {
                Ok(user) => {
                    req.extensions_mut().insert(CurrentUser {
                        id: user.id,
                        username: user.username,
                        token: token.token,
                    });
                }
                Err(e) => warn!("token for unknown user {}: {}", token.userid, e),
            }
        }
    }

    next.run(req).await
}

fn extract_token(req: &Request, params: &HashMap<String, String>) -> Option<String> {
    if let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = parse_bearer(auth_str) {
                return Some(token);
            }
        }
    }

    params.get("api_key").cloned()
}

fn parse_bearer(auth_str: &str) -> Option<String> {
    let (scheme, token) = auth_str.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
