use async_trait::async_trait;

use super::model::*;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_user(&self, username: &str) -> DbResult<User>;
    async fn get_user_by_id(&self, id: &str) -> DbResult<User>;
    /// Inserts a new user unless the username is taken. Returns false when
    /// another user already holds the name; that user is left untouched.
    async fn create_user(&self, user: &User) -> DbResult<bool>;
    async fn upsert_user(&self, user: &User) -> DbResult<()>;
}

#[async_trait]
pub trait AccessTokenRepo: Send + Sync {
    async fn get_token(&self, token: &str) -> DbResult<AccessToken>;
    async fn upsert_token(&self, token: &AccessToken) -> DbResult<()>;
    async fn delete_token(&self, token: &str) -> DbResult<()>;
}

/// Per-user watched list.
///
/// `add_watched` is a conditional write: the backing table has a unique
/// key on (owner, movie), so concurrent adds of the same pair yield one
/// `Inserted` and any number of `AlreadyPresent`.
#[async_trait]
pub trait WatchedRepo: Send + Sync {
    async fn add_watched(
        &self,
        owner_id: &str,
        movie_id: MovieId,
        title: &str,
        poster_path: &str,
    ) -> DbResult<AddOutcome>;
    /// Returns true if an entry was removed. Removing a missing entry is not an error.
    async fn remove_watched(&self, owner_id: &str, movie_id: MovieId) -> DbResult<bool>;
    /// No ordering guarantee.
    async fn list_watched(&self, owner_id: &str) -> DbResult<Vec<WatchedEntry>>;
    async fn is_watched(&self, owner_id: &str, movie_id: MovieId) -> DbResult<bool>;
}

#[async_trait]
pub trait ChatRepo: Send + Sync {
    async fn post_message(
        &self,
        room: ChatRoom,
        user_id: &str,
        username: &str,
        text: &str,
    ) -> DbResult<ChatMessage>;
    /// The most recent `limit` messages of a room, oldest first.
    async fn list_messages(&self, room: ChatRoom, limit: u32) -> DbResult<Vec<ChatMessage>>;
}

#[async_trait]
pub trait ReviewRepo: Send + Sync {
    async fn add_review(
        &self,
        movie_id: MovieId,
        user_id: &str,
        username: &str,
        content: &str,
    ) -> DbResult<Review>;
    /// Newest first.
    async fn list_reviews(&self, movie_id: MovieId) -> DbResult<Vec<Review>>;
    async fn upvote_review(&self, review_id: i64) -> DbResult<Review>;
}

#[async_trait]
pub trait PreferencesRepo: Send + Sync {
    async fn get_preferences(&self, user_id: &str) -> DbResult<Preferences>;
    async fn set_preferences(&self, user_id: &str, prefs: &Preferences) -> DbResult<()>;
}
