use serde::Deserialize;

use crate::services::similarity::StopWords;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of movies fetched into the corpus per request
    #[serde(default = "default_corpus_limit")]
    pub corpus_limit: usize,

    /// Number of recommendations returned when the caller does not ask for a count
    #[serde(default = "default_recommendation_count")]
    pub default_recommendation_count: usize,

    /// Stop-word list applied while vectorizing feature strings
    #[serde(default)]
    pub stop_words: StopWords,

    /// Per-request timeout for TMDB calls, in seconds
    #[serde(default = "default_tmdb_timeout_secs")]
    pub tmdb_timeout_secs: u64,

    /// Retries after a timed-out or refused TMDB connection
    #[serde(default = "default_tmdb_max_retries")]
    pub tmdb_max_retries: u32,

    /// Delay before the first retry, doubled on each further attempt
    #[serde(default = "default_tmdb_retry_base_ms")]
    pub tmdb_retry_base_ms: u64,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_corpus_limit() -> usize {
    1000
}

fn default_recommendation_count() -> usize {
    5
}

fn default_tmdb_timeout_secs() -> u64 {
    15
}

fn default_tmdb_max_retries() -> u32 {
    3
}

fn default_tmdb_retry_base_ms() -> u64 {
    1500
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_iter(std::env::vars())
    }

    /// Load configuration from an explicit set of key/value pairs
    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
