use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use super::auth::CurrentUser;
use super::error::{ApiError, ApiResult};
use super::types::PostMessageRequest;
use crate::db::{ChatMessage, ChatRepo, ChatRoom, MovieId};
use crate::server::AppState;

const HISTORY_LIMIT: u32 = 200;

/// Messages a live subscriber may fall behind before it skips ahead.
const LIVE_BUFFER: usize = 256;

/// Fan-out of stored chat messages to live subscribers of every room.
#[derive(Clone)]
pub struct ChatHub {
    tx: broadcast::Sender<ChatMessage>,
}

impl Default for ChatHub {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(LIVE_BUFFER);
        Self { tx }
    }
}

impl ChatHub {
    pub fn publish(&self, message: ChatMessage) {
        // No receivers is not an error.
        let _ = self.tx.send(message);
    }

    /// Messages of `room` published from now on.
    pub fn subscribe(&self, room: ChatRoom) -> impl Stream<Item = ChatMessage> {
        let key = room.key();
        stream::unfold(self.tx.subscribe(), move |mut rx| {
            let key = key.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok(msg) if msg.room == key => return Some((msg, rx)),
                        Ok(_) => continue,
                        Err(RecvError::Lagged(n)) => {
                            warn!(room = %key, skipped = n, "live chat subscriber lagged");
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        })
    }
}

pub async fn lobby_messages(State(state): State<AppState>) -> ApiResult<Json<Vec<ChatMessage>>> {
    list(&state, ChatRoom::Lobby).await
}

pub async fn post_lobby_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<PostMessageRequest>,
) -> ApiResult<Json<ChatMessage>> {
    post(&state, ChatRoom::Lobby, &user, &req.text).await
}

pub async fn movie_messages(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    list(&state, ChatRoom::Movie(movie_id)).await
}

pub async fn post_movie_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(movie_id): Path<MovieId>,
    Json(req): Json<PostMessageRequest>,
) -> ApiResult<Json<ChatMessage>> {
    post(&state, ChatRoom::Movie(movie_id), &user, &req.text).await
}

pub async fn lobby_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    live(&state, ChatRoom::Lobby)
}

pub async fn movie_stream(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    live(&state, ChatRoom::Movie(movie_id))
}

fn live(state: &AppState, room: ChatRoom) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    use futures::StreamExt;

    let events = state
        .chat
        .subscribe(room)
        .map(|msg| Event::default().event("message").json_data(&msg));
    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn list(state: &AppState, room: ChatRoom) -> ApiResult<Json<Vec<ChatMessage>>> {
    state
        .db
        .list_messages(room, HISTORY_LIMIT)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to fetch messages", e))
}

async fn post(
    state: &AppState,
    room: ChatRoom,
    user: &CurrentUser,
    text: &str,
) -> ApiResult<Json<ChatMessage>> {
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest("message text is empty".to_string()));
    }
    let message = state
        .db
        .post_message(room, &user.id, &user.username, text)
        .await
        .map_err(|e| ApiError::internal("Failed to send message", e))?;
    state.chat.publish(message.clone());
    Ok(Json(message))
}
