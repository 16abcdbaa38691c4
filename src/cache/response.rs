//! Long-lived cache of check results, keyed by request fingerprint.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheStore;
use crate::model::{ResolutionRequest, ResolvedMedia};

const KEY_PREFIX: &str = "check:";

/// Stable hash of a request's semantically significant fields.
///
/// `provider` is excluded on purpose: it only changes how the engine
/// searches, the format selection inputs fully determine the cached shape.
pub fn fingerprint(req: &ResolutionRequest) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    // Unit separator keeps ("ab", "c") distinct from ("a", "bc").
    hasher.update(req.query.as_bytes());
    hasher.update([0x1f]);
    hasher.update(req.kind.to_string().as_bytes());
    hasher.update([0x1f]);
    hasher.update([req.has_muxer as u8]);
    hasher.update([0x1f]);
    hasher.update(req.custom_format.as_deref().unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

/// Maps a resolution-request fingerprint to a previously computed result.
///
/// Cached values may reference handles whose entry in the handle cache has
/// already expired; clients that hit a 410 on download re-issue the check.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn get(&self, fingerprint: &str) -> Option<ResolvedMedia> {
        let raw = self.store.get(&format!("{KEY_PREFIX}{fingerprint}")).await?;
        match serde_json::from_str(&raw) {
            Ok(media) => Some(media),
            Err(e) => {
                // An undecodable entry is treated as a miss and re-resolved.
                tracing::warn!(error = %e, "dropping undecodable response cache entry");
                None
            }
        }
    }

    pub async fn put(&self, fingerprint: &str, media: &ResolvedMedia) {
        match serde_json::to_string(media) {
            Ok(raw) => {
                self.store
                    .set(&format!("{KEY_PREFIX}{fingerprint}"), raw, self.ttl)
                    .await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode response cache entry");
            }
        }
    }
}
