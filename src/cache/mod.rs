//! Handle and response caching.
//!
//! The key-value store behind both caches is a black box reached through
//! [`CacheStore`]. The default deployment uses the in-process
//! [`MemoryStore`]; when caching is disabled or the store cannot be
//! initialized, [`NullStore`] takes its place and every lookup is a miss —
//! same interface, no persistence, no crash.

mod handles;
mod response;
mod store;

pub use handles::{generate_handle, HandleCache};
pub use response::{fingerprint, ResponseCache};
pub use store::{CacheStore, MemoryStore, NullStore};

use std::sync::Arc;
use std::time::Duration;

/// Spawn a background janitor that periodically drops expired entries.
pub fn start_cleanup_task(
    store: Arc<dyn CacheStore>,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            store.cleanup_expired();
        }
    })
}
