use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::services::recommendations::SelfExclusion;

/// Application configuration loaded from environment variables
#[derive(Deserialize, Clone)]
pub struct Config {
    /// TMDB API key, read from `MOVIE_API_KEY`
    pub movie_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// TMDB image base URL (size variant is appended per request)
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// Path to the movie catalog artifact
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Path to the similarity matrix artifact
    #[serde(default = "default_similarity_path")]
    pub similarity_path: String,

    /// Outbound request timeout in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Minimum spacing between outbound requests in milliseconds
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,

    /// Maximum number of cached posters
    #[serde(default = "default_poster_cache_capacity")]
    pub poster_cache_capacity: usize,

    /// Lifetime of cached fetch failures; unset caches them for the process lifetime
    #[serde(default)]
    pub poster_negative_ttl_secs: Option<u64>,

    /// Maximum number of outbound requests in flight
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// How the queried movie is removed from its own ranking
    #[serde(default)]
    pub self_exclusion: SelfExclusion,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_catalog_path() -> String {
    "data/movies.json".to_string()
}

fn default_similarity_path() -> String {
    "data/similarity.json".to_string()
}

fn default_fetch_timeout_ms() -> u64 {
    5000
}

fn default_fetch_delay_ms() -> u64 {
    400
}

fn default_poster_cache_capacity() -> usize {
    1000
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    pub fn poster_negative_ttl(&self) -> Option<Duration> {
        self.poster_negative_ttl_secs.map(Duration::from_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// The API key must never end up in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("movie_api_key", &"<redacted>")
            .field("tmdb_api_url", &self.tmdb_api_url)
            .field("tmdb_image_url", &self.tmdb_image_url)
            .field("catalog_path", &self.catalog_path)
            .field("similarity_path", &self.similarity_path)
            .field("fetch_timeout_ms", &self.fetch_timeout_ms)
            .field("fetch_delay_ms", &self.fetch_delay_ms)
            .field("poster_cache_capacity", &self.poster_cache_capacity)
            .field("poster_negative_ttl_secs", &self.poster_negative_ttl_secs)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .field("self_exclusion", &self.self_exclusion)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}
