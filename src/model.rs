//! Core data model: resolution requests, stream candidates and resolved media.
//!
//! [`ResolutionRequest`] is validated from raw JSON before any cache or
//! network work happens; [`ResolvedMedia`] is both the API response shape and
//! the value stored in the response cache, so cached results are returned to
//! clients byte-for-byte identical to live ones.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::Provider;
use crate::error::{Error, Result};

/// Media kind requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// A validated check request. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub query: String,
    pub kind: MediaKind,
    pub has_muxer: bool,
    pub custom_format: Option<String>,
    pub provider: Provider,
}

impl ResolutionRequest {
    /// Validate a raw JSON body into a request.
    ///
    /// All field errors surface as [`Error::InvalidRequest`] before any
    /// resolution work occurs. `hasMuxer` accepts both JSON booleans and
    /// lenient string spellings ("yes", "true", "t", "y", "1").
    pub fn from_value(body: &serde_json::Value) -> Result<Self> {
        let obj = body
            .as_object()
            .ok_or_else(|| Error::invalid("request body must be a JSON object"))?;

        let query = obj
            .get("query")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Error::invalid("'query' is required and must be a non-empty string"))?
            .to_string();

        let kind = match obj.get("type").and_then(|v| v.as_str()) {
            Some(t) if t.eq_ignore_ascii_case("video") => MediaKind::Video,
            Some(t) if t.eq_ignore_ascii_case("audio") => MediaKind::Audio,
            Some(other) => {
                return Err(Error::invalid(format!(
                    "'type' must be \"video\" or \"audio\", got \"{other}\""
                )))
            }
            None => return Err(Error::invalid("'type' is required")),
        };

        let has_muxer = match obj.get("hasMuxer") {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => truthy(s),
            Some(_) => return Err(Error::invalid("'hasMuxer' must be a boolean")),
        };

        let custom_format = match obj.get("format") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s.trim().to_string()),
            Some(_) => return Err(Error::invalid("'format' must be a string")),
        };

        let provider = match obj.get("provider") {
            None | Some(serde_json::Value::Null) => Provider::default(),
            Some(serde_json::Value::String(s)) => s
                .parse::<Provider>()
                .map_err(|_| Error::invalid(format!("unknown provider \"{s}\"")))?,
            Some(_) => return Err(Error::invalid("'provider' must be a string")),
        };

        Ok(Self {
            query,
            kind,
            has_muxer,
            custom_format,
            provider,
        })
    }
}

/// Lenient boolean coercion for form-style string values.
fn truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "yes" | "true" | "t" | "y" | "1"
    )
}

/// A single downloadable stream, addressed by an opaque handle.
///
/// Created at resolution time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamCandidate {
    /// Opaque token standing in for the real upstream URL.
    pub handle: String,
    pub ext: String,
    pub format_id: String,
    pub approx_size_bytes: u64,
    /// True when the candidate meets or exceeds the single-response size
    /// ceiling and must be fetched with Range requests.
    pub oversized: bool,
    pub kind: MediaKind,
}

/// The outcome of a check: what is stored in the response cache and what
/// clients receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMedia {
    pub title: String,
    pub ext: String,
    /// True when the candidates are separate audio/video streams the
    /// consumer must mux itself.
    pub needs_mux: bool,
    pub candidates: Vec<StreamCandidate>,
}
