//! Poster client for the movie metadata service.
//!
//! This crate turns an external movie id into a poster image URL. It handles:
//! - Talking to the metadata service over HTTPS with a per-request timeout
//! - Retrying rate-limited and failed requests with fixed backoff
//! - Memoizing every outcome, including "no poster", for a bounded time
//! - Collapsing concurrent lookups of the same id into one fetch
//!
//! Failures never surface as errors: callers get `None` and show a placeholder.

pub mod cache;
pub mod config;
pub mod resolver;
pub mod transport;

pub use cache::{InMemoryPosterCache, PosterCache, PosterCacheEntry, PosterLookup};
pub use config::{ConfigError, PosterConfig};
pub use resolver::{is_valid_external_id, PosterResolver};
pub use transport::{HttpTransport, MetadataResponse, MetadataTransport, TransportError};
