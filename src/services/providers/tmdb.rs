//! TMDB (The Movie Database) v3 provider
//!
//! API Flow:
//! 1. Corpus: /genre/movie/list once, then /movie/popular page by page
//! 2. Search: /search/movie
//! 3. Discover: /discover/movie filtered by genre id and release year
//! 4. Details: /movie/{id}
//!
//! Listing endpoints only carry `genre_ids`, so genre names are resolved from
//! the genre list before building corpus movies. Timed-out and refused
//! connections are retried with exponential backoff; HTTP error statuses are not.

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{DiscoverFilter, Movie, MovieId, TmdbGenreList, TmdbMovie, TmdbPage},
    services::providers::CatalogProvider,
};
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::{collections::HashMap, time::Duration};

/// TMDB rejects listing requests beyond this page
const MAX_TMDB_PAGE: u32 = 500;

/// Backoff schedule for transient TMDB failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (1-based): base, 2x base, 4x base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Timeouts and failed connections are retried
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    retry: RetryPolicy,
}

impl TmdbProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            Duration::from_secs(config.tmdb_timeout_secs),
            RetryPolicy {
                max_retries: config.tmdb_max_retries,
                base_delay: Duration::from_millis(config.tmdb_retry_base_ms),
            },
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// GET `path` with the API key plus `params` and decode the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let response = self.send_with_retry(path, params).await?;
        let response = Self::check_status(response).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, path = %path, "Failed to deserialize TMDB response");
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }

    async fn send_with_retry(&self, path: &str, params: &[(&str, &str)]) -> AppResult<Response> {
        let mut attempt = 0;

        loop {
            let result = self
                .http_client
                .get(self.endpoint(path))
                .query(&[("api_key", self.api_key.as_str())])
                .query(params)
                .send()
                .await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if is_transient(&e) && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        error = %e,
                        path = %path,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        "TMDB request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        path = %path,
                        attempts = attempt + 1,
                        "TMDB request failed"
                    );
                    return Err(e.into());
                }
            }
        }
    }

    async fn check_status(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB resource not found: {}", body)));
        }

        Err(AppError::ExternalApi(format!(
            "TMDB API returned status {}: {}",
            status, body
        )))
    }

    /// Loads the genre ID -> name mapping
    async fn genre_names(&self) -> AppResult<HashMap<u32, String>> {
        let list: TmdbGenreList = self.get_json("/genre/movie/list", &[]).await?;
        Ok(list.genres.into_iter().map(|g| (g.id, g.name)).collect())
    }
}

/// Query parameters for `/discover/movie`
///
/// Genre names match case-insensitively; an unknown genre is dropped from the
/// query instead of failing it.
fn discover_params(
    filter: &DiscoverFilter,
    genre_names: &HashMap<u32, String>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![("sort_by", "popularity.desc".to_string())];

    if let Some(name) = filter.genre_name() {
        match genre_names.iter().find(|(_, g)| g.to_lowercase() == name) {
            Some((id, _)) => params.push(("with_genres", id.to_string())),
            None => tracing::warn!(genre = %name, "Unknown genre, discovering without it"),
        }
    }

    if let Some(year) = filter.release_year() {
        params.push(("primary_release_year", year.to_string()));
    }

    params
}

/// Appends a fetched page to `movies`, returning whether paging should continue
fn collect_page(
    movies: &mut Vec<Movie>,
    page: TmdbPage,
    genre_names: &HashMap<u32, String>,
    limit: usize,
) -> bool {
    if page.results.is_empty() {
        return false;
    }

    let remaining = limit.saturating_sub(movies.len());
    movies.extend(
        page.results
            .into_iter()
            .take(remaining)
            .map(|raw| raw.into_movie(genre_names)),
    );

    movies.len() < limit
        && page.page < MAX_TMDB_PAGE
        && (page.total_pages == 0 || page.page < page.total_pages)
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn fetch_corpus(&self, limit: usize) -> AppResult<Vec<Movie>> {
        let mut movies = Vec::with_capacity(limit);
        if limit == 0 {
            return Ok(movies);
        }

        let genre_names = self.genre_names().await?;
        let mut page_number: u32 = 1;

        loop {
            let page_param = page_number.to_string();
            let page: TmdbPage = self
                .get_json("/movie/popular", &[("page", page_param.as_str())])
                .await?;

            tracing::debug!(
                page = page_number,
                results = page.results.len(),
                total_pages = page.total_pages,
                "Fetched popular movies page"
            );

            if !collect_page(&mut movies, page, &genre_names, limit) {
                break;
            }
            page_number += 1;
        }

        tracing::info!(
            movies = movies.len(),
            pages = page_number,
            provider = "tmdb",
            "Corpus fetched"
        );

        Ok(movies)
    }

    async fn search_movies(&self, query: &str) -> AppResult<Vec<Movie>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let genre_names = self.genre_names().await?;
        let page: TmdbPage = self.get_json("/search/movie", &[("query", query)]).await?;

        let movies: Vec<Movie> = page
            .results
            .into_iter()
            .map(|raw| raw.into_movie(&genre_names))
            .collect();

        tracing::info!(
            query = %query,
            results = movies.len(),
            provider = "tmdb",
            "Movie search completed"
        );

        Ok(movies)
    }

    async fn discover(&self, filter: &DiscoverFilter) -> AppResult<Vec<Movie>> {
        let genre_names = self.genre_names().await?;
        let params = discover_params(filter, &genre_names);
        let params: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let page: TmdbPage = self.get_json("/discover/movie", &params).await?;
        let movies: Vec<Movie> = page
            .results
            .into_iter()
            .map(|raw| raw.into_movie(&genre_names))
            .collect();

        tracing::info!(
            genre = ?filter.genre,
            year = ?filter.year,
            results = movies.len(),
            provider = "tmdb",
            "Movie discovery completed"
        );

        Ok(movies)
    }

    async fn movie_details(&self, id: &MovieId) -> AppResult<Movie> {
        let raw: TmdbMovie = self
            .get_json(&format!("/movie/{}", id), &[])
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound(format!("Movie {} not found", id)),
                other => other,
            })?;

        Ok(raw.into_movie(&HashMap::new()))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn page_of(page: u32, total_pages: u32, ids: std::ops::Range<u64>) -> TmdbPage {
        let results = ids
            .map(|id| TmdbMovie {
                id,
                title: Some(format!("Movie {}", id)),
                overview: None,
                poster_path: None,
                vote_average: Some(7.0),
                genre_ids: vec![18],
                genres: None,
            })
            .collect();
        TmdbPage {
            page,
            results,
            total_pages,
        }
    }

    fn genres() -> HashMap<u32, String> {
        HashMap::from([(18, "Drama".to_string())])
    }

    fn provider(api_url: &str) -> TmdbProvider {
        TmdbProvider::new(
            "key".to_string(),
            api_url.to_string(),
            Duration::from_secs(1),
            RetryPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let provider = provider("http://test.local/3/");
        assert_eq!(provider.endpoint("/movie/popular"), "http://test.local/3/movie/popular");
    }

    #[test]
    fn test_from_config_uses_retry_settings() {
        let config = Config::from_iter([
            ("TMDB_API_KEY".to_string(), "secret".to_string()),
            ("TMDB_MAX_RETRIES".to_string(), "1".to_string()),
            ("TMDB_RETRY_BASE_MS".to_string(), "200".to_string()),
        ])
        .unwrap();
        let provider = TmdbProvider::from_config(&config).unwrap();
        assert_eq!(
            provider.retry,
            RetryPolicy {
                max_retries: 1,
                base_delay: Duration::from_millis(200),
            }
        );
    }

    #[test]
    fn test_backoff_doubles_from_base_delay() {
        let policy = RetryPolicy::default();
        let delays: Vec<u128> = (1..=3).map(|a| policy.delay_for(a).as_millis()).collect();
        assert_eq!(delays, vec![1500, 3000, 6000]);
        assert_eq!(policy.delay_for(0), Duration::from_millis(1500));
        assert!(policy.delay_for(64) > policy.delay_for(3));
    }

    #[tokio::test]
    async fn test_refused_connection_is_transient() {
        let error = HttpClient::new()
            .get("http://127.0.0.1:1/movie/popular")
            .send()
            .await
            .unwrap_err();
        assert!(is_transient(&error));
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_transient() {
        let error = HttpClient::new().get("not a url").send().await.unwrap_err();
        assert!(!is_transient(&error));
    }

    #[tokio::test]
    async fn test_timed_out_requests_are_retried() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = accepted.clone();
        tokio::spawn(async move {
            // Hold every connection open without answering
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(socket);
            }
        });

        let provider = TmdbProvider::new(
            "key".to_string(),
            format!("http://{}", addr),
            Duration::from_millis(50),
            RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(1),
            },
        )
        .unwrap();

        let result: AppResult<TmdbPage> = provider.get_json("/movie/popular", &[]).await;

        assert!(matches!(result, Err(AppError::HttpClient(ref e)) if e.is_timeout()));
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_discover_params_resolve_genre_and_year() {
        let names = HashMap::from([
            (28, "Action".to_string()),
            (878, "Science Fiction".to_string()),
        ]);
        let filter = DiscoverFilter {
            genre: Some("science fiction".to_string()),
            year: Some("1999".to_string()),
        };

        assert_eq!(
            discover_params(&filter, &names),
            vec![
                ("sort_by", "popularity.desc".to_string()),
                ("with_genres", "878".to_string()),
                ("primary_release_year", "1999".to_string()),
            ]
        );
    }

    #[test]
    fn test_discover_params_drop_unknown_genre_and_bad_year() {
        let filter = DiscoverFilter {
            genre: Some("Space Opera".to_string()),
            year: Some("nineteen".to_string()),
        };

        assert_eq!(
            discover_params(&filter, &genres()),
            vec![("sort_by", "popularity.desc".to_string())]
        );
    }

    #[test]
    fn test_collect_page_continues_until_limit() {
        let mut movies = Vec::new();
        assert!(collect_page(&mut movies, page_of(1, 10, 0..20), &genres(), 50));
        assert_eq!(movies.len(), 20);
        assert_eq!(movies[0].genres, vec!["Drama"]);
    }

    #[test]
    fn test_collect_page_truncates_to_limit() {
        let mut movies = Vec::new();
        assert!(collect_page(&mut movies, page_of(1, 10, 0..20), &genres(), 30));
        assert!(!collect_page(&mut movies, page_of(2, 10, 20..40), &genres(), 30));
        assert_eq!(movies.len(), 30);
        assert_eq!(movies.last().map(|m| m.id.clone()), Some(MovieId::Number(29)));
    }

    #[test]
    fn test_collect_page_stops_on_empty_page() {
        let mut movies = Vec::new();
        assert!(!collect_page(&mut movies, page_of(3, 10, 0..0), &genres(), 50));
        assert!(movies.is_empty());
    }

    #[test]
    fn test_collect_page_stops_on_last_page() {
        let mut movies = Vec::new();
        assert!(!collect_page(&mut movies, page_of(2, 2, 0..5), &genres(), 50));
        assert_eq!(movies.len(), 5);
    }

    #[test]
    fn test_collect_page_stops_at_last_servable_page() {
        let mut movies = Vec::new();
        assert!(collect_page(&mut movies, page_of(499, 1000, 0..20), &genres(), 20_000));
        assert!(!collect_page(&mut movies, page_of(500, 1000, 20..40), &genres(), 20_000));
        assert_eq!(movies.len(), 40);
    }

    #[test]
    fn test_tmdb_page_deserialization() {
        let json = r#"{
            "page": 1,
            "results": [
                {
                    "id": 550,
                    "title": "Fight Club",
                    "overview": "An insomniac office worker",
                    "poster_path": "/fightclub.jpg",
                    "vote_average": 8.4,
                    "genre_ids": [18]
                }
            ],
            "total_pages": 500,
            "total_results": 10000
        }"#;

        let page: TmdbPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 500);
        let movie = page.results[0].clone().into_movie(&genres());
        assert_eq!(movie.id, MovieId::Number(550));
        assert_eq!(movie.title, "Fight Club");
        assert_eq!(movie.genres, vec!["Drama"]);
    }

    #[tokio::test]
    async fn test_search_rejects_blank_query() {
        let provider = provider("http://test.local");
        let result = provider.search_movies("   ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_zero_limit_skips_network() {
        let provider = provider("http://test.local");
        let movies = provider.fetch_corpus(0).await.unwrap();
        assert!(movies.is_empty());
    }
}
