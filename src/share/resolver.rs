use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{error, info};

use super::codec;
use crate::catalog::{Catalog, CatalogError};
use crate::db::MovieId;

/// Largest list a share token may carry.
pub const MAX_SHARED_IDS: usize = 500;

/// Catalog lookups in flight per resolved list.
pub const LOOKUP_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedMovie {
    pub id: MovieId,
    pub title: String,
    pub poster_path: String,
}

/// Movies of a shared list, in token order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SharedList {
    pub movies: Vec<SharedMovie>,
}

impl SharedList {
    pub fn get(&self, id: MovieId) -> Option<&SharedMovie> {
        self.movies.iter().find(|m| m.id == id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("No shared list found.")]
    NoSharedList,
    #[error("Failed to load shared movies. The link might be invalid or expired.")]
    LoadFailed(#[source] CatalogError),
    #[error("Failed to load shared movies. The link might be invalid or expired.")]
    TooLarge(usize),
}

/// Resolves a share token against the catalog.
///
/// All lookups must succeed; a single failed lookup fails the whole list.
/// Lists longer than [`MAX_SHARED_IDS`] are rejected without any lookup.
pub async fn resolve(catalog: &dyn Catalog, token: Option<&str>) -> Result<SharedList, ShareError> {
    let token = match token {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(ShareError::NoSharedList),
    };

    let ids = codec::decode(token);
    if ids.is_empty() {
        return Err(ShareError::NoSharedList);
    }

    if ids.len() > MAX_SHARED_IDS {
        error!(count = ids.len(), "shared list too large");
        return Err(ShareError::TooLarge(ids.len()));
    }

    let movies: Vec<_> = stream::iter(ids)
        .map(|id| catalog.movie(id))
        .buffered(LOOKUP_CONCURRENCY)
        .try_collect()
        .await
        .map_err(|e| {
            error!("Error fetching shared movies: {}", e);
            ShareError::LoadFailed(e)
        })?;

    info!(count = movies.len(), "resolved shared list");

    Ok(SharedList {
        movies: movies
            .into_iter()
            .map(|m| SharedMovie {
                poster_path: m.poster_path_or_empty().to_string(),
                id: m.id,
                title: m.title,
            })
            .collect(),
    })
}

/// `<origin>/share?list=<token>`
pub fn share_url(origin: &str, token: &str) -> String {
    format!(
        "{}/share?list={}",
        origin.trim_end_matches('/'),
        urlencoding::encode(token)
    )
}
