//! Cache store abstraction and implementations.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

/// TTL-aware key-value store.
///
/// Per-key get/set are atomic by contract; callers never need a
/// read-modify-write across keys. Implementations must be safe for
/// concurrent use from many request tasks.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a live value. Expired or absent keys return `None`.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value with a time-to-live.
    async fn set(&self, key: &str, value: String, ttl: Duration);

    /// Drop expired entries eagerly. Lazy-expiry stores may leave this a
    /// no-op; `get` must still never return an expired value.
    fn cleanup_expired(&self) {}

    /// Whether this store actually persists anything.
    fn is_enabled(&self) -> bool {
        true
    }
}

struct Entry {
    value: String,
    inserted: Instant,
    expires_at: Instant,
}

/// In-process TTL store backed by a concurrent map.
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    max_entries: usize,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
        }
    }

    /// Number of live (not yet cleaned) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(4096)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        None
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(key) {
            self.evict_oldest();
        }

        let now = Instant::now();
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                inserted: now,
                expires_at: now + ttl,
            },
        );
    }

    fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| now < entry.expires_at);
    }
}

/// Store that never persists anything: every lookup is a miss.
///
/// Used when caching is disabled so the rest of the system keeps working
/// with the same interface, just without cross-request persistence.
pub struct NullStore;

#[async_trait]
impl CacheStore for NullStore {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) {}

    fn is_enabled(&self) -> bool {
        false
    }
}
