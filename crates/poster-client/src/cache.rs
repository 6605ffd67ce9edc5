//! Time-bounded memo of poster lookups.
//!
//! `PosterCache` is the seam; `InMemoryPosterCache` is the process-local
//! implementation. Entries carry their own expiry so definitive and transient
//! outcomes can live for different lengths of time.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Final outcome of looking up one external id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PosterLookup {
    /// Absolute image URL
    Found(String),
    /// The service answered, and there is no poster (no `poster_path`, or a
    /// non-retryable status)
    Missing,
    /// Every round was rate limited or failed in transport
    Unavailable,
}

impl PosterLookup {
    pub fn poster_url(&self) -> Option<&str> {
        match self {
            PosterLookup::Found(url) => Some(url.as_str()),
            PosterLookup::Missing | PosterLookup::Unavailable => None,
        }
    }

    pub fn into_poster_url(self) -> Option<String> {
        match self {
            PosterLookup::Found(url) => Some(url),
            PosterLookup::Missing | PosterLookup::Unavailable => None,
        }
    }

    /// Whether a later attempt could reasonably produce a different answer
    pub fn is_transient(&self) -> bool {
        matches!(self, PosterLookup::Unavailable)
    }
}

/// A cached lookup and its lifetime
#[derive(Debug, Clone)]
pub struct PosterCacheEntry {
    pub value: PosterLookup,
    pub fetched_at: Instant,
    pub expires_at: Instant,
}

impl PosterCacheEntry {
    pub fn new(value: PosterLookup, ttl: Duration) -> Self {
        let fetched_at = Instant::now();
        Self {
            value,
            fetched_at,
            expires_at: fetched_at + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Storage for poster lookups keyed by external id
pub trait PosterCache: Send + Sync {
    /// Unexpired value for `key`, if any
    fn get(&self, key: &str) -> Option<PosterLookup>;

    fn put(&self, key: &str, value: PosterLookup, ttl: Duration);

    /// Drop `key`; returns whether an entry was present
    fn invalidate(&self, key: &str) -> bool;

    fn clear(&self);

    /// Number of stored entries, expired ones included until evicted
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local cache behind a read-write lock
#[derive(Debug, Default)]
pub struct InMemoryPosterCache {
    entries: RwLock<HashMap<String, PosterCacheEntry>>,
}

impl InMemoryPosterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full entry for `key`, expired or not
    pub fn entry(&self, key: &str) -> Option<PosterCacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Remove every expired entry; returns how many were dropped
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}

impl PosterCache for InMemoryPosterCache {
    fn get(&self, key: &str) -> Option<PosterLookup> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: evict, unless a writer refreshed it in between
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        None
    }

    /// Also drops every expired entry, so ids that are never read again
    /// don't linger
    fn put(&self, key: &str, value: PosterLookup, ttl: Duration) {
        let entry = PosterCacheEntry::new(value, ttl);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, existing| !existing.is_expired(entry.fetched_at));
        entries.insert(key.to_string(), entry);
    }

    fn invalidate(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
