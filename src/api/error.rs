use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::share::ShareError;

/// Errors returned by API handlers, rendered as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    /// The catalog could not be reached or returned garbage.
    #[error("{0}")]
    Catalog(String),

    /// Store failures. The cause is logged, the client only sees the message.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(message: &str, cause: impl std::fmt::Display) -> Self {
        error!("{}: {}", message, cause);
        ApiError::Internal(message.to_string())
    }

    pub fn catalog(message: &str, cause: impl std::fmt::Display) -> Self {
        error!("{}: {}", message, cause);
        ApiError::Catalog(message.to_string())
    }
}

impl From<ShareError> for ApiError {
    fn from(e: ShareError) -> Self {
        match e {
            ShareError::NoSharedList => ApiError::NotFound(e.to_string()),
            ShareError::LoadFailed(_) | ShareError::TooLarge(_) => ApiError::Catalog(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Catalog(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
