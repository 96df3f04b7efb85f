use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};

use crate::clock::Clock;
use crate::models::UpstreamParams;

/// How long a stored response stays valid for reads
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Canonical cache key for an upstream request
///
/// Built from the resolved upstream path and the key-sorted, form-encoded
/// query string, so parameter insertion order never changes the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(path: &str, params: &UpstreamParams) -> Self {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        // BTreeMap iteration is already key-ordered
        for (key, value) in params {
            query.append_pair(key, &value.to_string());
        }
        Self(format!("{}?{}", path, query.finish()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Last successful upstream response, keyed by its fingerprint in the cache
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized upstream body
    pub payload: Arc<str>,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Age of the entry at `now`; entries from the future count as fresh
    fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// In-memory response cache with a fixed time-to-live
///
/// Entries are replaced whole on every `put`, so readers never observe a
/// partially written payload. Expired entries read as absent; physically
/// removing them is left to the janitor.
pub struct ResponseCache {
    entries: DashMap<Fingerprint, CacheEntry>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ResponseCache {
    /// Creates an empty cache using the standard TTL
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, CACHE_TTL)
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            ttl,
        }
    }

    /// Retrieves a fresh value from the cache by fingerprint
    ///
    /// Returns `None` when the entry is missing, older than the TTL, or its
    /// payload no longer deserializes. A corrupt entry is dropped so the next
    /// successful fetch can replace it.
    pub fn get<T: DeserializeOwned>(&self, fingerprint: &Fingerprint) -> Option<T> {
        let (payload, stored_at) = {
            let entry = self.entries.get(fingerprint)?;
            if entry.age(self.clock.now()) >= self.ttl {
                tracing::debug!(fingerprint = %fingerprint, "Cache entry expired");
                return None;
            }
            (Arc::clone(&entry.payload), entry.stored_at)
        };

        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    error = %e,
                    "Cache deserialization error, treating as miss"
                );
                self.entries
                    .remove_if(fingerprint, |_, entry| entry.stored_at == stored_at);
                None
            }
        }
    }

    /// Stores a value, replacing any previous entry for the fingerprint
    pub fn put<T: Serialize>(&self, fingerprint: &Fingerprint, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(fingerprint = %fingerprint, error = %e, "Cache serialization error");
                return;
            }
        };
        self.put_raw(fingerprint, payload);
    }

    /// Stores an already serialized payload
    pub fn put_raw(&self, fingerprint: &Fingerprint, payload: impl Into<Arc<str>>) {
        let entry = CacheEntry {
            payload: payload.into(),
            stored_at: self.clock.now(),
        };
        self.entries.insert(fingerprint.clone(), entry);
    }

    /// Removes every entry older than the TTL and returns how many were removed
    ///
    /// `DashMap::retain` locks one shard at a time, so concurrent reads and
    /// writes to other shards proceed during the sweep.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.age(now) <= self.ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Number of entries physically stored, including expired ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry is physically stored, fresh or not
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }
}
