//! In-memory catalog for tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

#[derive(Default)]
pub struct StubCatalog {
    /// Ids whose lookup answers with a 404.
    pub failing: HashSet<MovieId>,
    calls: AtomicUsize,
}

impl StubCatalog {
    pub fn failing(ids: &[MovieId]) -> Self {
        Self {
            failing: ids.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn make_movie(id: MovieId) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            poster_path: Some(format!("/{}.jpg", id)),
            overview: None,
            release_date: None,
            vote_average: None,
        }
    }

    fn page(ids: &[MovieId]) -> MoviePage {
        MoviePage {
            page: 1,
            results: ids.iter().map(|&id| Self::make_movie(id)).collect(),
            total_pages: Some(1),
        }
    }
}

#[async_trait]
impl Catalog for StubCatalog {
    async fn movie(&self, id: MovieId) -> CatalogResult<Movie> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&id) {
            return Err(CatalogError::Status(404));
        }
        Ok(Self::make_movie(id))
    }

    async fn popular(&self, page: u32) -> CatalogResult<MoviePage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut p = Self::page(&[1, 2, 3]);
        p.page = page.max(1);
        Ok(p)
    }

    async fn trending(&self) -> CatalogResult<MoviePage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::page(&[10, 20]))
    }

    async fn search(&self, _query: &str) -> CatalogResult<MoviePage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::page(&[1, 2, 3, 4, 5, 6, 7]))
    }
}
