#[cfg(test)]
pub mod stub;
pub mod tmdb;
pub mod types;

pub use tmdb::TmdbClient;
pub use types::*;

use async_trait::async_trait;

use crate::db::MovieId;

/// Source of movie metadata.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn movie(&self, id: MovieId) -> CatalogResult<Movie>;
    async fn popular(&self, page: u32) -> CatalogResult<MoviePage>;
    async fn trending(&self) -> CatalogResult<MoviePage>;
    async fn search(&self, query: &str) -> CatalogResult<MoviePage>;
}
