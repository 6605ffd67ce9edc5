//! Poster client configuration.
//!
//! Loaded from `TMDB_*` environment variables (a `.env` file is honoured), or
//! built in code with `PosterConfig::new` and the `with_*` setters.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while building a `PosterConfig` or the HTTP client behind it
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load poster config from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid poster config: {0}")]
    Invalid(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Settings for talking to the metadata service and caching its answers
#[derive(Deserialize, Clone)]
pub struct PosterConfig {
    /// Metadata service API key (`TMDB_API_KEY`)
    pub api_key: String,

    /// Metadata API root, without trailing slash
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Prefix joined with `poster_path` to form the image URL
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Fetch rounds per id before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait after a 429 before the next round
    #[serde(default = "default_rate_limit_backoff_secs")]
    pub rate_limit_backoff_secs: u64,

    /// Wait after a transport error before the next round
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,

    /// How long a definitive answer (poster or no poster) is kept
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// How long an exhausted-retries answer is kept
    #[serde(default = "default_transient_ttl_secs")]
    pub transient_ttl_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_rate_limit_backoff_secs() -> u64 {
    2
}

fn default_error_backoff_secs() -> u64 {
    1
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_transient_ttl_secs() -> u64 {
    15 * 60
}

impl PosterConfig {
    /// Config with every default and the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: default_api_base_url(),
            image_base_url: default_image_base_url(),
            language: default_language(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            rate_limit_backoff_secs: default_rate_limit_backoff_secs(),
            error_backoff_secs: default_error_backoff_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            transient_ttl_secs: default_transient_ttl_secs(),
        }
    }

    /// Load configuration from `TMDB_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = envy::prefixed("TMDB_").from_env::<PosterConfig>()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the resolver can't work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("api_key must not be empty".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".to_string()));
        }
        if self.api_base_url.trim().is_empty() || self.image_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base URLs must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_image_base_url(mut self, url: impl Into<String>) -> Self {
        self.image_base_url = url.into();
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Configure the waits after a 429 and after a transport error
    pub fn with_backoff(mut self, rate_limit_secs: u64, error_secs: u64) -> Self {
        self.rate_limit_backoff_secs = rate_limit_secs;
        self.error_backoff_secs = error_secs;
        self
    }

    /// Configure the definitive and transient cache lifetimes
    pub fn with_ttls(mut self, cache_ttl_secs: u64, transient_ttl_secs: u64) -> Self {
        self.cache_ttl_secs = cache_ttl_secs;
        self.transient_ttl_secs = transient_ttl_secs;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_secs(self.rate_limit_backoff_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn transient_ttl(&self) -> Duration {
        Duration::from_secs(self.transient_ttl_secs)
    }

    /// Absolute image URL for a `poster_path` such as `/abc.jpg`
    pub fn image_url(&self, poster_path: &str) -> String {
        format!("{}{}", self.image_base_url.trim_end_matches('/'), poster_path)
    }

    /// Metadata endpoint for one movie (query parameters added by the transport)
    pub fn movie_url(&self, external_id: &str) -> String {
        format!("{}/movie/{}", self.api_base_url.trim_end_matches('/'), external_id)
    }
}

// Keep the API key out of logs
impl fmt::Debug for PosterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PosterConfig")
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("image_base_url", &self.image_base_url)
            .field("language", &self.language)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("rate_limit_backoff_secs", &self.rate_limit_backoff_secs)
            .field("error_backoff_secs", &self.error_backoff_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("transient_ttl_secs", &self.transient_ttl_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PosterConfig::new("key");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.rate_limit_backoff(), Duration::from_secs(2));
        assert_eq!(config.error_backoff(), Duration::from_secs(1));
        assert_eq!(config.cache_ttl(), Duration::from_secs(86_400));
        assert!(config.transient_ttl() < config.cache_ttl());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_urls() {
        let config = PosterConfig::new("key");
        assert_eq!(
            config.image_url("/x.jpg"),
            "https://image.tmdb.org/t/p/w500/x.jpg"
        );
        assert_eq!(
            config.movie_url("603"),
            "https://api.themoviedb.org/3/movie/603"
        );

        let config = config.with_api_base_url("http://localhost:8080/3/");
        assert_eq!(config.movie_url("1"), "http://localhost:8080/3/movie/1");
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        assert!(PosterConfig::new("  ").validate().is_err());
        assert!(PosterConfig::new("key").with_max_attempts(0).validate().is_err());
        assert!(PosterConfig::new("key").with_image_base_url("").validate().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", PosterConfig::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let config: PosterConfig =
            serde_json::from_str(r#"{"api_key": "k", "max_attempts": 5}"#).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.language, "en-US");
        assert_eq!(config.cache_ttl_secs, 86_400);
    }
}
