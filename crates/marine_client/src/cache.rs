//! In-memory TTL cache for raw upstream responses.
//!
//! Uses `DashMap` so concurrent scan points can read without contention.
//! Entries are never mutated: a miss stores a fresh entry, replacing any
//! expired one wholesale. Expiry is checked lazily on read.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

/// A cached upstream payload.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Arc<Value>,
    pub stored_at: Instant,
}

impl CacheEntry {
    /// Expired once `now - stored_at >= ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    /// Entry lifetime in seconds.
    pub ttl: u64,
}

/// Response cache owned by one client instance.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a live entry's payload, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<Arc<Value>> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                return Some(Arc::clone(&entry.payload));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            self.entries
                .remove_if(key, |_, entry| entry.is_expired(self.ttl));
        }
        None
    }

    pub fn set(&self, key: impl Into<String>, payload: Value) -> Arc<Value> {
        let payload = Arc::new(payload);
        self.entries.insert(
            key.into(),
            CacheEntry {
                payload: Arc::clone(&payload),
                stored_at: Instant::now(),
            },
        );
        payload
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            ttl: self.ttl.as_secs(),
        }
    }
}

/// Structural hash of a request: endpoint kind plus the full, order-independent parameter set.
pub fn cache_key(endpoint: &str, params: &[(String, String)]) -> String {
    let sorted: BTreeMap<&str, &str> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    // Serializing a (&str, BTreeMap<&str, &str>) cannot fail.
    let canonical = serde_json::to_string(&(endpoint, sorted)).unwrap_or_default();

    let digest = Sha256::digest(canonical.as_bytes());
    format!("{}:{:x}", endpoint, digest)
}
