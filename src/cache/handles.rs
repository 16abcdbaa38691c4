//! Short-lived download handles.
//!
//! A handle is an opaque, unguessable token standing in for a real (and
//! otherwise sensitive) upstream media URL. The token space is 256 bits, so
//! collisions with live handles are not explicitly detected.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheStore;

const KEY_PREFIX: &str = "handle:";

/// Maps opaque handles to upstream URLs, TTL-bound.
///
/// The resolver only writes entries, the range proxy only reads them.
#[derive(Clone)]
pub struct HandleCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl HandleCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Mint a fresh handle for `url` and persist it for the handle TTL.
    pub async fn mint(&self, url: &str) -> String {
        let handle = generate_handle();
        self.store
            .set(&format!("{KEY_PREFIX}{handle}"), url.to_string(), self.ttl)
            .await;
        handle
    }

    /// Resolve a handle back to its URL. `None` means unknown or expired.
    pub async fn resolve(&self, handle: &str) -> Option<String> {
        self.store.get(&format!("{KEY_PREFIX}{handle}")).await
    }
}

/// Generate a random URL-safe handle token.
pub fn generate_handle() -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    URL_SAFE_NO_PAD.encode(bytes)
}
