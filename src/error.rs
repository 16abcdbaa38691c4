//! Unified error type for the streamgate service.
//!
//! Every failure mode funnels into [`Error`], which carries enough context
//! for the HTTP layer to derive a status code via [`Error::http_status`].
//! Nothing here is retried automatically: clients are expected to re-issue
//! `check` after a `HandleExpired` and retry `download` after a transient
//! `UpstreamUnavailable`.

use crate::engine::EngineError;

/// Unified error type covering all failure modes in streamgate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request data was missing or malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The resolution engine found nothing usable for the query.
    #[error("nothing found: {0}")]
    NotFound(String),

    /// The resolution engine raised an extraction error.
    #[error("resolution failed: {0}")]
    ResolutionFailed(String),

    /// The download handle is unknown or past its TTL.
    #[error("handle expired or unknown, request a new one via check")]
    HandleExpired,

    /// The upstream origin could not be reached or answered with an
    /// unexpected status.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A full-file download would exceed the response size ceiling.
    #[error("response would be {size} bytes (limit {limit}), client must use Range requests")]
    PayloadTooLarge {
        /// Size reported by the upstream origin.
        size: u64,
        /// Configured single-response ceiling.
        limit: u64,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidRequest(_) => 400,
            Error::NotFound(_) => 404,
            Error::ResolutionFailed(_) => 500,
            Error::HandleExpired => 410,
            Error::UpstreamUnavailable(_) => 502,
            Error::PayloadTooLarge { .. } => 400,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::InvalidRequest`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidRequest(message.into())
    }

    /// Convenience constructor for [`Error::UpstreamUnavailable`].
    pub fn upstream(message: impl Into<String>) -> Self {
        Error::UpstreamUnavailable(message.into())
    }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::NotFound => Error::NotFound("no usable streams for query".into()),
            EngineError::Extraction(msg) => Error::ResolutionFailed(msg),
            other => Error::ResolutionFailed(other.to_string()),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
