//! Poster resolution with retry, backoff and memoization.
//!
//! ## Algorithm
//! 1. Reject ids that aren't all ASCII digits (no request, nothing cached)
//! 2. Serve unexpired cache entries, including cached "no poster" answers
//! 3. Otherwise take the per-id in-flight lock, so concurrent callers for the
//!    same id share one fetch
//! 4. Fetch in up to `max_attempts` sequential rounds:
//!    - 200: poster URL from `poster_path`, or no poster. Done.
//!    - 429: wait `rate_limit_backoff`, next round
//!    - other status: no poster. Done.
//!    - transport error / malformed body: wait `error_backoff`, next round
//! 5. Cache the outcome: definitive answers for `cache_ttl`, exhausted
//!    retries for the shorter `transient_ttl`
//!
//! Nothing here returns an error. Every failure degrades to "no poster".

use crate::cache::{InMemoryPosterCache, PosterCache, PosterLookup};
use crate::config::{ConfigError, PosterConfig};
use crate::transport::{HttpTransport, MetadataTransport, TransportError};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, instrument, warn};

const STATUS_OK: u16 = 200;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// The one field we need from `GET /movie/{id}`
#[derive(Debug, Deserialize)]
struct MovieDetails {
    poster_path: Option<String>,
}

/// Whether `id` can be sent to the metadata service
pub fn is_valid_external_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Resolves external ids to poster image URLs
pub struct PosterResolver {
    config: PosterConfig,
    transport: Arc<dyn MetadataTransport>,
    cache: Arc<dyn PosterCache>,
    /// One lock per id currently being fetched
    in_flight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PosterResolver {
    /// Resolver over HTTPS with an in-memory cache
    pub fn new(config: PosterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(config.clone())?);
        Ok(Self::with_parts(
            config,
            transport,
            Arc::new(InMemoryPosterCache::new()),
        ))
    }

    /// Resolver over a caller-supplied transport and cache
    pub fn with_parts(
        config: PosterConfig,
        transport: Arc<dyn MetadataTransport>,
        cache: Arc<dyn PosterCache>,
    ) -> Self {
        Self {
            config,
            transport,
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &PosterConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn PosterCache> {
        &self.cache
    }

    /// Poster image URL for `external_id`, or `None` when there is none or it
    /// couldn't be fetched. Callers render a placeholder for `None`.
    pub async fn resolve_poster(&self, external_id: Option<&str>) -> Option<String> {
        let id = external_id?;
        if !is_valid_external_id(id) {
            debug!(external_id = %id, "Skipping poster lookup for non-numeric id");
            return None;
        }
        self.lookup(id).await.into_poster_url()
    }

    /// Full lookup outcome for an already-validated id
    #[instrument(skip(self))]
    pub async fn lookup(&self, external_id: &str) -> PosterLookup {
        if let Some(hit) = self.cache.get(external_id) {
            debug!("Poster cache hit");
            return hit;
        }

        let key_lock = self.in_flight_lock(external_id);
        let outcome = {
            let _guard = key_lock.lock().await;

            // Someone else may have finished the fetch while we waited
            match self.cache.get(external_id) {
                Some(hit) => {
                    debug!("Poster resolved by concurrent request");
                    hit
                }
                None => {
                    let outcome = self.fetch(external_id).await;
                    let ttl = if outcome.is_transient() {
                        self.config.transient_ttl()
                    } else {
                        self.config.cache_ttl()
                    };
                    self.cache.put(external_id, outcome.clone(), ttl);
                    outcome
                }
            }
        };

        self.release_in_flight_lock(external_id, key_lock);
        outcome
    }

    fn in_flight_lock(&self, external_id: &str) -> Arc<AsyncMutex<()>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(external_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn release_in_flight_lock(&self, external_id: &str, key_lock: Arc<AsyncMutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // Map + this handle: nobody else is waiting on it
        if Arc::strong_count(&key_lock) == 2 {
            in_flight.remove(external_id);
        }
    }

    /// Number of ids with a fetch in progress or waiters queued
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run the fetch rounds for one id
    async fn fetch(&self, external_id: &str) -> PosterLookup {
        let attempts = self.config.max_attempts;

        for attempt in 1..=attempts {
            let last = attempt == attempts;

            let result = match self.transport.fetch_movie(external_id).await {
                Ok(response) if response.status == STATUS_OK => {
                    self.parse_details(&response.body).map(|details| {
                        match details.poster_path.filter(|p| !p.is_empty()) {
                            Some(path) => PosterLookup::Found(self.config.image_url(&path)),
                            None => PosterLookup::Missing,
                        }
                    })
                }
                Ok(response) if response.status == STATUS_TOO_MANY_REQUESTS => {
                    warn!(attempt, "Metadata service rate limited the request");
                    if !last {
                        tokio::time::sleep(self.config.rate_limit_backoff()).await;
                    }
                    continue;
                }
                Ok(response) => {
                    debug!(status = response.status, "Metadata service returned no usable record");
                    return PosterLookup::Missing;
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(outcome) => return outcome,
                Err(e) => {
                    warn!(attempt, error = %e, "Error fetching poster");
                    if !last {
                        tokio::time::sleep(self.config.error_backoff()).await;
                    }
                }
            }
        }

        warn!(attempts, "Poster lookup gave up after all attempts");
        PosterLookup::Unavailable
    }

    fn parse_details(&self, body: &str) -> Result<MovieDetails, TransportError> {
        serde_json::from_str(body).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}
