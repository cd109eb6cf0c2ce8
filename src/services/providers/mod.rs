//! Movie catalog abstraction
//!
//! Supplies the recommendation corpus and the browse/search lookups served
//! alongside it. Implementations own their credentials and base URL.

use crate::{
    error::AppResult,
    models::{DiscoverFilter, Movie, MovieId},
};

pub mod tmdb;

pub use tmdb::{RetryPolicy, TmdbProvider};

/// Trait for movie catalog providers
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch up to `limit` popular movies, in catalog order
    async fn fetch_corpus(&self, limit: usize) -> AppResult<Vec<Movie>>;

    /// Search movies by title
    async fn search_movies(&self, query: &str) -> AppResult<Vec<Movie>>;

    /// Most popular movies matching a genre and/or release year
    async fn discover(&self, filter: &DiscoverFilter) -> AppResult<Vec<Movie>>;

    /// Fetch a single movie by ID
    async fn movie_details(&self, id: &MovieId) -> AppResult<Movie>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
