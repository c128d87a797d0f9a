use serde::{Deserialize, Serialize};

use crate::db::{MovieId, WatchedEntry};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShareQuery {
    pub list: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddWatchedRequest {
    pub movie_id: MovieId,
    pub title: Option<String>,
    pub poster_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddWatchedResponse {
    pub added: bool,
    pub entry: WatchedEntry,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WatchedListResponse {
    pub watched_movies: Vec<WatchedEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WatchedStatus {
    pub movie_id: MovieId,
    pub watched: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveWatchedResponse {
    pub removed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareLinkResponse {
    pub token: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct PostReviewRequest {
    pub content: String,
}
