use serde::{Deserialize, Serialize};

use crate::db::MovieId;

/// A movie as returned by the catalog, trimmed to the fields we use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
}

impl Movie {
    pub fn poster_path_or_empty(&self) -> &str {
        self.poster_path.as_deref().unwrap_or("")
    }
}

/// A page of results: `{"page": 1, "results": [...], ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoviePage {
    #[serde(default)]
    pub page: u32,
    pub results: Vec<Movie>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Catalog returned status {0}")]
    Status(u16),
    #[error("Unexpected catalog response: {0}")]
    Shape(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
