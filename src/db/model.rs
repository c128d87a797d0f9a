use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog (TMDB) movie identifier.
pub type MovieId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created: Option<DateTime<Utc>>,
    pub lastlogin: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub userid: String,
    pub created: Option<DateTime<Utc>>,
    pub lastused: Option<DateTime<Utc>>,
}

/// One movie on a user's watched list. Unique per (owner_id, movie_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedEntry {
    pub owner_id: String,
    pub movie_id: MovieId,
    pub title: String,
    pub poster_path: String,
    pub added_at: DateTime<Utc>,
}

/// Result of a conditional insert into the watched list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    AlreadyPresent,
}

/// A chat room: the global lobby, or the room attached to one movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRoom {
    Lobby,
    Movie(MovieId),
}

impl ChatRoom {
    pub fn key(&self) -> String {
        match self {
            ChatRoom::Lobby => "lobby".to_string(),
            ChatRoom::Movie(id) => format!("movie:{}", id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub room: String,
    pub userid: String,
    pub username: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub movie_id: MovieId,
    pub userid: String,
    pub username: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub upvotes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub dark_mode: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;
