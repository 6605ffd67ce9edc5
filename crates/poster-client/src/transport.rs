//! Transport to the metadata service.
//!
//! The resolver only needs "GET the movie record for this id" and the raw
//! status and body back; retry policy and JSON handling live in the resolver.

use crate::config::{ConfigError, PosterConfig};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use thiserror::Error;
use tracing::debug;

/// Raw answer from the metadata service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponse {
    pub status: u16,
    pub body: String,
}

impl MetadataResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A request that never produced a usable HTTP response
#[derive(Error, Debug)]
pub enum TransportError {
    /// Timeout, connection failure, or unreadable body
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    /// A 200 response whose body wasn't the expected JSON
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Fetches movie metadata by external id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataTransport: Send + Sync {
    async fn fetch_movie(&self, external_id: &str) -> Result<MetadataResponse, TransportError>;
}

/// `MetadataTransport` over HTTPS with a per-request timeout
#[derive(Clone)]
pub struct HttpTransport {
    http_client: HttpClient,
    config: PosterConfig,
}

impl HttpTransport {
    pub fn new(config: PosterConfig) -> Result<Self, ConfigError> {
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl MetadataTransport for HttpTransport {
    async fn fetch_movie(&self, external_id: &str) -> Result<MetadataResponse, TransportError> {
        let url = self.config.movie_url(external_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("language", self.config.language.as_str()),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(external_id = %external_id, status, "Metadata response received");
        Ok(MetadataResponse { status, body })
    }
}
