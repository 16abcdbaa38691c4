//! The download endpoint: range-proxy bytes from the upstream origin.
//!
//! A handle resolves to the real upstream URL; the proxy then either relays
//! the whole file (small enough to fit under the response-size ceiling) or a
//! bounded byte window per Range request. Each request opens a fresh
//! upstream fetch; a dropped client drops the upstream body with it.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use futures::TryStreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::server::AppContext;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/download", get(download))
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    handle: String,
}

/// `GET /api/download?handle=<token>` with an optional `Range` header.
async fn download(
    State(ctx): State<AppContext>,
    Query(query): Query<DownloadQuery>,
    headers: axum::http::HeaderMap,
) -> Result<Response> {
    let url = ctx
        .handles
        .resolve(&query.handle)
        .await
        .ok_or(Error::HandleExpired)?;

    // Any Range header at all selects range mode; an unreadable value is
    // just another malformed Range and starts at offset 0.
    let range = headers
        .get(header::RANGE)
        .map(|h| h.to_str().map(parse_range_start).unwrap_or(0));

    match range {
        Some(start) => stream_window(&ctx, &url, start).await,
        None => stream_full(&ctx, &url).await,
    }
}

/// Parse the start offset from a `Range` header.
///
/// Lenient on purpose: anything that does not look like `bytes=<start>-...`
/// falls back to offset 0 rather than rejecting the request.
fn parse_range_start(raw: &str) -> u64 {
    raw.trim()
        .strip_prefix("bytes=")
        .and_then(|rest| rest.split('-').next())
        .and_then(|start| start.trim().parse().ok())
        .unwrap_or(0)
}

/// Issue an upstream GET bounded by the header deadline.
///
/// Only connect and response headers are covered; the body stream stays
/// unbounded so long downloads are not cut off mid-transfer.
async fn fetch(ctx: &AppContext, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let deadline = std::time::Duration::from_secs(ctx.config.proxy.header_timeout_secs);
    match tokio::time::timeout(deadline, request.send()).await {
        Ok(Ok(upstream)) => Ok(upstream),
        Ok(Err(e)) => Err(Error::upstream(e.to_string())),
        Err(_) => Err(Error::upstream(format!(
            "origin sent no response headers within {}s",
            deadline.as_secs()
        ))),
    }
}

/// Relay the complete file, guarded by the response-size ceiling.
async fn stream_full(ctx: &AppContext, url: &str) -> Result<Response> {
    let upstream = fetch(ctx, ctx.upstream.get(url)).await?;

    if !upstream.status().is_success() {
        return Err(Error::upstream(format!(
            "origin returned {}",
            upstream.status()
        )));
    }

    let limit = ctx.config.proxy.max_response_size;
    if let Some(size) = upstream.content_length() {
        if size >= limit {
            // Reject before a single body byte moves.
            return Err(Error::PayloadTooLarge { size, limit });
        }
    }

    debug!(url = %url, "relaying full upstream body");
    relay(upstream, StatusCode::OK)
}

/// Relay a bounded window starting at `start`, asking the origin for
/// exactly one range-window worth of bytes.
async fn stream_window(ctx: &AppContext, url: &str, start: u64) -> Result<Response> {
    // The start offset is client-controlled; saturate rather than overflow
    // near the top of the u64 range.
    let end = start.saturating_add(ctx.config.proxy.range_window);

    let upstream = fetch(
        ctx,
        ctx.upstream
            .get(url)
            .header(reqwest::header::RANGE, format!("bytes={start}-{end}")),
    )
    .await?;

    let status = upstream.status();
    if !status.is_success() {
        return Err(Error::upstream(format!("origin returned {status}")));
    }

    debug!(url = %url, start, end, status = %status, "relaying upstream window");

    // Forward the origin's own status: 206 normally, 200 when the origin
    // ignored the range and sent everything.
    let status =
        StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::PARTIAL_CONTENT);
    relay(upstream, status)
}

/// Headers forwarded from the origin to the client.
const FORWARDED_HEADERS: [&str; 4] = [
    "content-type",
    "content-length",
    "content-range",
    "accept-ranges",
];

/// Turn an upstream response into a streamed client response.
///
/// The body is a single-pass lazy byte stream bound to this one upstream
/// connection; nothing is buffered beyond the in-flight chunk.
fn relay(upstream: reqwest::Response, status: StatusCode) -> Result<Response> {
    let mut builder = Response::builder().status(status);

    for name in FORWARDED_HEADERS {
        if let Some(value) = upstream.headers().get(name) {
            if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
                builder = builder.header(name, value);
            }
        }
    }

    let stream = upstream.bytes_stream().map_err(std::io::Error::other);
    builder
        .body(Body::from_stream(stream))
        .map_err(|e| Error::Internal(e.to_string()))
}
