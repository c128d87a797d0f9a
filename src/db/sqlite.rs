use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::model::*;
use super::repo::*;

type WatchedRow = (String, i64, String, String, String);
type ChatRow = (i64, String, String, String, String, String);
type ReviewRow = (i64, i64, String, String, String, String, i64);

pub struct SqliteRepository {
    pool: SqlitePool,
    token_cache: Arc<RwLock<HashMap<String, AccessToken>>>,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self {
            pool,
            token_cache: Arc::new(RwLock::new(HashMap::new())),
        };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::raw_sql(schema).execute(&self.pool).await?;
        Ok(())
    }

    pub fn start_background_tasks(self: Arc<Self>) {
        let repo_clone = Arc::clone(&self);
        tokio::spawn(async move {
            repo_clone.token_flush_loop().await;
        });
    }

    async fn token_flush_loop(&self) {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(10));
        loop {
            interval.tick().await;
            if let Err(e) = self.flush_token_cache().await {
                error!("Failed to flush token cache: {}", e);
            }
        }
    }

    /// Writes the cached `lastused` times back to the database.
    async fn flush_token_cache(&self) -> DbResult<()> {
        let cache = self.token_cache.read().await;
        for token in cache.values() {
            sqlx::query("UPDATE accesstokens SET lastused = ? WHERE token = ?")
                .bind(token.lastused.as_ref().map(|dt| dt.to_rfc3339()))
                .bind(&token.token)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn get_review(&self, review_id: i64) -> DbResult<Review> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, movie_id, userid, username, content, timestamp, upvotes
             FROM reviews WHERE id = ?",
        )
        .bind(review_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("Review not found: {}", review_id)),
            _ => DbError::Sqlx(e),
        })?;

        Ok(review_from_row(row))
    }
}

fn parse_time(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

fn watched_from_row(r: WatchedRow) -> WatchedEntry {
    WatchedEntry {
        owner_id: r.0,
        movie_id: r.1,
        title: r.2,
        poster_path: r.3,
        added_at: parse_time(Some(r.4)).unwrap_or_default(),
    }
}

fn chat_from_row(r: ChatRow) -> ChatMessage {
    ChatMessage {
        id: r.0,
        room: r.1,
        userid: r.2,
        username: r.3,
        text: r.4,
        timestamp: parse_time(Some(r.5)).unwrap_or_default(),
    }
}

fn review_from_row(r: ReviewRow) -> Review {
    Review {
        id: r.0,
        movie_id: r.1,
        userid: r.2,
        username: r.3,
        content: r.4,
        timestamp: parse_time(Some(r.5)).unwrap_or_default(),
        upvotes: r.6,
    }
}

#[async_trait]
impl UserRepo for SqliteRepository {
    async fn get_user(&self, username: &str) -> DbResult<User> {
        let r = sqlx::query_as::<_, (String, String, String, Option<String>, Option<String>)>(
            "SELECT id, username, password, created, lastlogin FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("User not found: {}", username)),
            _ => DbError::Sqlx(e),
        })?;

        Ok(User {
            id: r.0,
            username: r.1,
            password: r.2,
            created: parse_time(r.3),
            lastlogin: parse_time(r.4),
        })
    }

    async fn get_user_by_id(&self, id: &str) -> DbResult<User> {
        let r = sqlx::query_as::<_, (String, String, String, Option<String>, Option<String>)>(
            "SELECT id, username, password, created, lastlogin FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("User not found: {}", id)),
            _ => DbError::Sqlx(e),
        })?;

        Ok(User {
            id: r.0,
            username: r.1,
            password: r.2,
            created: parse_time(r.3),
            lastlogin: parse_time(r.4),
        })
    }

    async fn create_user(&self, user: &User) -> DbResult<bool> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, password, created, lastlogin) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(username) DO NOTHING",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.created.as_ref().map(|dt| dt.to_rfc3339()))
        .bind(user.lastlogin.as_ref().map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn upsert_user(&self, user: &User) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, password, created, lastlogin) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                password = excluded.password,
                lastlogin = excluded.lastlogin",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.created.as_ref().map(|dt| dt.to_rfc3339()))
        .bind(user.lastlogin.as_ref().map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AccessTokenRepo for SqliteRepository {
    async fn get_token(&self, token: &str) -> DbResult<AccessToken> {
        {
            let mut cache = self.token_cache.write().await;
            if let Some(t) = cache.get_mut(token) {
                t.lastused = Some(Utc::now());
                return Ok(t.clone());
            }
        }

        let result = sqlx::query_as::<_, (String, String, Option<String>, Option<String>)>(
            "SELECT token, userid, created, lastused FROM accesstokens WHERE token = ?",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound("Token not found".to_string()),
            _ => DbError::Sqlx(e),
        })?;

        let access_token = AccessToken {
            token: result.0,
            userid: result.1,
            created: parse_time(result.2),
            lastused: Some(Utc::now()),
        };

        let mut cache = self.token_cache.write().await;
        cache.insert(token.to_string(), access_token.clone());

        Ok(access_token)
    }

    async fn upsert_token(&self, token: &AccessToken) -> DbResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO accesstokens (token, userid, created, lastused) VALUES (?, ?, ?, ?)",
        )
        .bind(&token.token)
        .bind(&token.userid)
        .bind(token.created.as_ref().map(|dt| dt.to_rfc3339()))
        .bind(token.lastused.as_ref().map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        let mut cache = self.token_cache.write().await;
        cache.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn delete_token(&self, token: &str) -> DbResult<()> {
        {
            let mut cache = self.token_cache.write().await;
            cache.remove(token);
        }

        sqlx::query("DELETE FROM accesstokens WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WatchedRepo for SqliteRepository {
    async fn add_watched(
        &self,
        owner_id: &str,
        movie_id: MovieId,
        title: &str,
        poster_path: &str,
    ) -> DbResult<AddOutcome> {
        let result = sqlx::query(
            "INSERT INTO watched (owner_id, movie_id, title, poster_path, added_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (owner_id, movie_id) DO NOTHING",
        )
        .bind(owner_id)
        .bind(movie_id)
        .bind(title)
        .bind(poster_path)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(owner = owner_id, movie_id, "movie already in watched list");
            Ok(AddOutcome::AlreadyPresent)
        } else {
            Ok(AddOutcome::Inserted)
        }
    }

    async fn remove_watched(&self, owner_id: &str, movie_id: MovieId) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM watched WHERE owner_id = ? AND movie_id = ?")
            .bind(owner_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_watched(&self, owner_id: &str) -> DbResult<Vec<WatchedEntry>> {
        let results = sqlx::query_as::<_, WatchedRow>(
            "SELECT owner_id, movie_id, title, poster_path, added_at FROM watched WHERE owner_id = ?",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results.into_iter().map(watched_from_row).collect())
    }

    async fn is_watched(&self, owner_id: &str, movie_id: MovieId) -> DbResult<bool> {
        let (exists,) = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS (SELECT 1 FROM watched WHERE owner_id = ? AND movie_id = ?)",
        )
        .bind(owner_id)
        .bind(movie_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl ChatRepo for SqliteRepository {
    async fn post_message(
        &self,
        room: ChatRoom,
        user_id: &str,
        username: &str,
        text: &str,
    ) -> DbResult<ChatMessage> {
        let timestamp = Utc::now();
        let result = sqlx::query(
            "INSERT INTO chat_messages (room, userid, username, text, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(room.key())
        .bind(user_id)
        .bind(username)
        .bind(text)
        .bind(timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(ChatMessage {
            id: result.last_insert_rowid(),
            room: room.key(),
            userid: user_id.to_string(),
            username: username.to_string(),
            text: text.to_string(),
            timestamp,
        })
    }

    async fn list_messages(&self, room: ChatRoom, limit: u32) -> DbResult<Vec<ChatMessage>> {
        let results = sqlx::query_as::<_, ChatRow>(
            "SELECT id, room, userid, username, text, timestamp FROM (
                SELECT id, room, userid, username, text, timestamp FROM chat_messages
                WHERE room = ? ORDER BY id DESC LIMIT ?
             ) ORDER BY id ASC",
        )
        .bind(room.key())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(results.into_iter().map(chat_from_row).collect())
    }
}

#[async_trait]
impl ReviewRepo for SqliteRepository {
    async fn add_review(
        &self,
        movie_id: MovieId,
        user_id: &str,
        username: &str,
        content: &str,
    ) -> DbResult<Review> {
        let timestamp = Utc::now();
        let result = sqlx::query(
            "INSERT INTO reviews (movie_id, userid, username, content, timestamp, upvotes) VALUES (?, ?, ?, ?, ?, 0)",
        )
        .bind(movie_id)
        .bind(user_id)
        .bind(username)
        .bind(content)
        .bind(timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Review {
            id: result.last_insert_rowid(),
            movie_id,
            userid: user_id.to_string(),
            username: username.to_string(),
            content: content.to_string(),
            timestamp,
            upvotes: 0,
        })
    }

    async fn list_reviews(&self, movie_id: MovieId) -> DbResult<Vec<Review>> {
        let results = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, movie_id, userid, username, content, timestamp, upvotes
             FROM reviews WHERE movie_id = ? ORDER BY id DESC",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results.into_iter().map(review_from_row).collect())
    }

    async fn upvote_review(&self, review_id: i64) -> DbResult<Review> {
        let result = sqlx::query("UPDATE reviews SET upvotes = upvotes + 1 WHERE id = ?")
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Review not found: {}", review_id)));
        }
        self.get_review(review_id).await
    }
}

#[async_trait]
impl PreferencesRepo for SqliteRepository {
    async fn get_preferences(&self, user_id: &str) -> DbResult<Preferences> {
        let row = sqlx::query_as::<_, (bool,)>("SELECT dark_mode FROM preferences WHERE userid = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row
            .map(|(dark_mode,)| Preferences { dark_mode })
            .unwrap_or_default())
    }

    async fn set_preferences(&self, user_id: &str, prefs: &Preferences) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO preferences (userid, dark_mode) VALUES (?, ?)
             ON CONFLICT (userid) DO UPDATE SET dark_mode = excluded.dark_mode",
        )
        .bind(user_id)
        .bind(prefs.dark_mode)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
