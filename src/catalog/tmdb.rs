use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::*;
use super::Catalog;
use crate::config::CatalogConfig;
use crate::db::MovieId;

/// Catalog backed by the TMDB v3 REST API.
#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &CatalogConfig) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> CatalogResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "catalog request");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "catalog request failed");
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| CatalogError::Shape(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl Catalog for TmdbClient {
    async fn movie(&self, id: MovieId) -> CatalogResult<Movie> {
        self.get_json(&format!("/movie/{}", id), &[]).await
    }

    async fn popular(&self, page: u32) -> CatalogResult<MoviePage> {
        let page = page.max(1);
        self.get_json("/movie/popular", &[("page", page.to_string())])
            .await
    }

    async fn trending(&self) -> CatalogResult<MoviePage> {
        self.get_json("/trending/movie/week", &[]).await
    }

    async fn search(&self, query: &str) -> CatalogResult<MoviePage> {
        self.get_json("/search/movie", &[("query", query.to_string())])
            .await
    }
}
