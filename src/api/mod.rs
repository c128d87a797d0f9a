pub mod auth;
pub mod chat;
pub mod error;
pub mod movies;
pub mod preferences;
pub mod reviews;
pub mod share;
#[cfg(test)]
mod tests;
pub mod types;
pub mod watched;

pub use auth::CurrentUser;
pub use error::{ApiError, ApiResult};

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

pub fn build_api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/users/me", get(auth::current_user))
        .route("/api/movies/popular", get(movies::popular))
        .route("/api/movies/trending", get(movies::trending))
        .route("/api/movies/search", get(movies::search))
        .route("/api/movies/:movie_id", get(movies::movie_details))
        .route(
            "/api/movies/:movie_id/reviews",
            get(reviews::list_reviews).post(reviews::post_review),
        )
        .route("/api/reviews/:review_id/upvote", post(reviews::upvote_review))
        .route(
            "/api/watched",
            get(watched::list_watched).post(watched::add_watched),
        )
        .route("/api/watched/share", get(watched::share_link))
        .route(
            "/api/watched/:movie_id",
            get(watched::watched_status).delete(watched::remove_watched),
        )
        .route("/api/share", get(share::get_shared_list))
        .route(
            "/api/chat",
            get(chat::lobby_messages).post(chat::post_lobby_message),
        )
        .route(
            "/api/chat/:movie_id",
            get(chat::movie_messages).post(chat::post_movie_message),
        )
        .route("/api/stream/chat", get(chat::lobby_stream))
        .route("/api/stream/chat/:movie_id", get(chat::movie_stream))
        .route(
            "/api/preferences",
            get(preferences::get_preferences).put(preferences::set_preferences),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            auth::auth_middleware,
        ))
}
