//! Check orchestration: response cache, format selection, engine call,
//! handle minting.
//!
//! There is no single-flight coalescing here: two concurrent identical
//! checks both invoke the engine and both mint their own handles. Both
//! succeed; the second `put` simply overwrites the first.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{fingerprint, HandleCache, ResponseCache};
use crate::engine::ResolutionEngine;
use crate::error::Result;
use crate::model::{ResolutionRequest, ResolvedMedia, StreamCandidate};
use crate::selector;

pub struct Resolver {
    engine: Arc<dyn ResolutionEngine>,
    handles: HandleCache,
    responses: ResponseCache,
    filesize_cap_mb: u64,
    max_response_size: u64,
}

impl Resolver {
    pub fn new(
        engine: Arc<dyn ResolutionEngine>,
        handles: HandleCache,
        responses: ResponseCache,
        filesize_cap_mb: u64,
        max_response_size: u64,
    ) -> Self {
        Self {
            engine,
            handles,
            responses,
            filesize_cap_mb,
            max_response_size,
        }
    }

    /// Answer a check request.
    ///
    /// A response-cache hit is returned unchanged, even though the handles
    /// inside may already be past their (shorter) TTL; a client hitting 410
    /// on download re-issues the check.
    pub async fn check(&self, req: &ResolutionRequest) -> Result<ResolvedMedia> {
        let fp = fingerprint(req);

        if let Some(cached) = self.responses.get(&fp).await {
            debug!(fingerprint = %fp, "response cache hit");
            return Ok(cached);
        }

        let expr = selector::build(
            req.kind,
            req.has_muxer,
            req.custom_format.as_deref(),
            self.filesize_cap_mb,
        );

        let resolution = self
            .engine
            .resolve(&req.query, req.provider, &expr)
            .await?;

        let mut candidates = Vec::with_capacity(resolution.streams.len());
        for stream in resolution.streams {
            let handle = self.handles.mint(&stream.url).await;
            candidates.push(StreamCandidate {
                handle,
                ext: stream.ext,
                format_id: stream.format_id,
                approx_size_bytes: stream.approx_size,
                oversized: stream.approx_size >= self.max_response_size,
                kind: stream.kind,
            });
        }

        let media = ResolvedMedia {
            title: resolution.title,
            ext: resolution.ext,
            needs_mux: resolution.needs_mux,
            candidates,
        };

        self.responses.put(&fp, &media).await;
        info!(
            query = %req.query,
            candidates = media.candidates.len(),
            needs_mux = media.needs_mux,
            "resolved media query"
        );

        Ok(media)
    }
}
