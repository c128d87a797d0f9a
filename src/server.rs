use axum::{extract::Request, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::sync::Arc;
use tower::Layer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::api::chat::ChatHub;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::db::SqliteRepository;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<SqliteRepository>,
    pub catalog: Arc<dyn Catalog>,
    pub chat: ChatHub,
}

impl AppState {
    pub fn new(config: Config, db: Arc<SqliteRepository>, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            config: Arc::new(config),
            db,
            catalog,
            chat: ChatHub::default(),
        }
    }
}

/// The service handed to the listener: `build_router` behind slash
/// collapsing. The outer router accepts any request body and rewrites the
/// path before the inner router matches a route.
pub fn build_app(state: AppState) -> Router {
    let router = build_router(state);
    Router::new().fallback_service(
        axum::middleware::from_fn(crate::middleware::normalize_path).layer(router),
    )
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .merge(crate::api::build_api_router(state.clone()))
        .fallback(fallback_handler);

    if let Some(ref appdir) = state.config.appdir {
        // The frontend handles /share?list=... itself.
        router = router.fallback_service(ServeDir::new(appdir));
    }

    router
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Access tokens may travel in `?api_key=`; the span carries the path only.
fn request_span(req: &Request) -> tracing::Span {
    tracing::debug_span!("request", method = %req.method(), path = %req.uri().path())
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request) -> impl IntoResponse {
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
