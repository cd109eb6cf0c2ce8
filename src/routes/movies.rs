use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{DiscoverFilter, Movie, MovieId},
    routes::AppState,
};

/// Size of one TMDB listing page
const POPULAR_PAGE_SIZE: usize = 20;

/// Discover and mood lookups answer with a short list
const SHORTLIST_SIZE: usize = 5;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
}

/// Handler for the popular movies listing
pub async fn popular(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.catalog.fetch_corpus(POPULAR_PAGE_SIZE).await?;
    Ok(Json(movies))
}

/// Handler for movie search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.catalog.search_movies(&params.query).await?;
    Ok(Json(movies))
}

#[derive(Debug, Deserialize)]
pub struct MoodQuery {
    #[serde(default)]
    keywords: String,
}

/// Handler for genre/year discovery, most popular first
pub async fn discover(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<DiscoverFilter>,
) -> AppResult<Json<Vec<Movie>>> {
    let mut movies = state.catalog.discover(&filter).await?;
    movies.truncate(SHORTLIST_SIZE);
    Ok(Json(movies))
}

/// Handler for mood lookups: a keyword search cut to a short list
pub async fn mood(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MoodQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let mut movies = state.catalog.search_movies(&params.keywords).await?;
    movies.truncate(SHORTLIST_SIZE);
    Ok(Json(movies))
}

/// Handler for movie details
pub async fn details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MovieId>,
) -> AppResult<Json<Movie>> {
    let movie = state.catalog.movie_details(&id).await?;
    Ok(Json(movie))
}
