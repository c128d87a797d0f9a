//! Share tokens: the watched list's movie ids as a JSON array, base64 encoded.
//!
//! Tokens are produced with the URL-safe alphabet without padding. Decoding
//! also accepts the standard alphabet, padded or not.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use tracing::warn;

use crate::db::{MovieId, WatchedEntry};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("not valid base64")]
    Base64,
    #[error("not a JSON array of integers: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn encode_ids(ids: &[MovieId]) -> String {
    // Serializing a slice of integers cannot fail.
    let json = serde_json::to_vec(ids).unwrap_or_else(|_| b"[]".to_vec());
    URL_SAFE_NO_PAD.encode(json)
}

/// Encodes the movie ids of `entries`, in the order given.
pub fn encode(entries: &[WatchedEntry]) -> String {
    let ids: Vec<MovieId> = entries.iter().map(|e| e.movie_id).collect();
    encode_ids(&ids)
}

pub fn try_decode(token: &str) -> Result<Vec<MovieId>, TokenError> {
    let token = token.trim();
    let bytes = [&URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(token).ok())
        .ok_or(TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Decodes a share token. Malformed tokens decode to an empty list.
pub fn decode(token: &str) -> Vec<MovieId> {
    match try_decode(token) {
        Ok(ids) => ids,
        Err(e) => {
            warn!(token = token, "Error decoding watched list: {}", e);
            Vec::new()
        }
    }
}
