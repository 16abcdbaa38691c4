//! Resolution engine abstraction.
//!
//! The external media-resolution engine is consumed as a black box: given a
//! query and a format-selection expression it returns stream metadata or a
//! typed extraction error. [`ytdlp::YtDlpEngine`] is the production
//! implementation; tests substitute their own [`ResolutionEngine`].

mod ytdlp;

pub use ytdlp::YtDlpEngine;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;

use crate::model::MediaKind;

/// How many results a music-catalog search considers.
const MUSIC_SEARCH_LIMIT: u32 = 5;

/// Search strategy applied to non-URL queries.
///
/// A closed set: providers are selected by tag, never by matching arbitrary
/// strings at dispatch time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    /// Plain web search on the default site.
    #[default]
    Default,
    /// Search on the alternate streaming site.
    AlternateSite,
    /// Music-catalog search, limited to the first few results.
    MusicCatalog,
}

impl Provider {
    /// Turn a raw query into the string handed to the engine.
    ///
    /// Direct URLs pass through untouched; anything else gets this
    /// provider's search prefix.
    pub fn search_query(&self, query: &str) -> String {
        if query.starts_with("http://") || query.starts_with("https://") {
            return query.to_string();
        }
        match self {
            Provider::Default => format!("ytsearch:{query}"),
            Provider::AlternateSite => format!("scsearch:{query}"),
            Provider::MusicCatalog => format!("ytmsearch{MUSIC_SEARCH_LIMIT}:{query}"),
        }
    }
}

impl FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "default" | "youtube" => Ok(Provider::Default),
            "soundcloud" | "alternate" => Ok(Provider::AlternateSite),
            "music" | "ytmusic" => Ok(Provider::MusicCatalog),
            _ => Err(()),
        }
    }
}

/// One addressable stream reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStream {
    pub url: String,
    pub ext: String,
    pub format_id: String,
    /// Approximate size in bytes; zero when the engine reported none.
    pub approx_size: u64,
    pub kind: MediaKind,
}

/// Successful engine result, before handles are minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub title: String,
    pub ext: String,
    /// True when `streams` are separate sub-streams that require muxing.
    pub needs_mux: bool,
    pub streams: Vec<EngineStream>,
}

/// Failure modes of an engine invocation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine succeeded but produced zero usable stream URLs.
    #[error("no usable streams found")]
    NotFound,

    /// The engine reported an extraction error.
    #[error("{0}")]
    Extraction(String),

    /// The invocation exceeded its deadline.
    #[error("engine timed out after {0:?}")]
    Timeout(Duration),

    /// The engine process could not be run.
    #[error("failed to run engine: {0}")]
    Io(#[from] std::io::Error),

    /// The engine produced output we could not decode.
    #[error("unreadable engine output: {0}")]
    Parse(String),
}

/// External media-resolution engine.
#[async_trait]
pub trait ResolutionEngine: Send + Sync {
    /// Resolve a query to stream metadata under the given format expression.
    async fn resolve(
        &self,
        query: &str,
        provider: Provider,
        format_expr: &str,
    ) -> Result<Resolution, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_bypass_the_search_prefix() {
        let url = "https://video.example/watch?v=abc";
        assert_eq!(Provider::Default.search_query(url), url);
        assert_eq!(Provider::MusicCatalog.search_query(url), url);
    }

    #[test]
    fn plain_queries_get_prefixed() {
        assert_eq!(
            Provider::Default.search_query("test song"),
            "ytsearch:test song"
        );
        assert_eq!(
            Provider::AlternateSite.search_query("test song"),
            "scsearch:test song"
        );
        assert_eq!(
            Provider::MusicCatalog.search_query("test song"),
            "ytmsearch5:test song"
        );
    }

    #[test]
    fn provider_parses_known_names() {
        assert_eq!("default".parse(), Ok(Provider::Default));
        assert_eq!("youtube".parse(), Ok(Provider::Default));
        assert_eq!("soundcloud".parse(), Ok(Provider::AlternateSite));
        assert_eq!("music".parse(), Ok(Provider::MusicCatalog));
        assert_eq!("YTMUSIC".parse(), Ok(Provider::MusicCatalog));
        assert!("vimeo".parse::<Provider>().is_err());
    }
}
