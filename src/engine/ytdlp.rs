//! yt-dlp subprocess engine.
//!
//! Invokes the yt-dlp binary with `--dump-json` and decodes its single-line
//! JSON output into a [`Resolution`]. When the selected format is a merged
//! audio+video pair, yt-dlp reports the sub-streams under
//! `requested_formats` and the consumer has to mux them itself.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::engine::{EngineError, EngineStream, Provider, Resolution, ResolutionEngine};
use crate::model::MediaKind;

pub struct YtDlpEngine {
    binary: String,
    timeout: Duration,
}

impl YtDlpEngine {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ResolutionEngine for YtDlpEngine {
    async fn resolve(
        &self,
        query: &str,
        provider: Provider,
        format_expr: &str,
    ) -> Result<Resolution, EngineError> {
        let target = provider.search_query(query);
        debug!(target = %target, format = %format_expr, "invoking yt-dlp");

        let socket_timeout = self.timeout.as_secs().max(1).to_string();
        let child = Command::new(&self.binary)
            .args([
                "--dump-json",
                "--no-playlist",
                "--no-warnings",
                "--socket-timeout",
                &socket_timeout,
                "-f",
                format_expr,
                &target,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| EngineError::Timeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Extraction(extraction_message(&stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_resolution(&stdout)
    }
}

/// Pull the first `ERROR:` line out of stderr, falling back to the last
/// non-empty line when yt-dlp died without its usual prefix.
fn extraction_message(stderr: &str) -> String {
    stderr
        .lines()
        .find_map(|line| line.strip_prefix("ERROR:").map(|m| m.trim().to_string()))
        .or_else(|| {
            stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(String::from)
        })
        .unwrap_or_else(|| "engine failed without diagnostics".to_string())
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    title: Option<String>,
    ext: Option<String>,
    url: Option<String>,
    format_id: Option<String>,
    filesize: Option<u64>,
    filesize_approx: Option<u64>,
    vcodec: Option<String>,
    acodec: Option<String>,
    requested_formats: Option<Vec<RawFormat>>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    url: Option<String>,
    ext: Option<String>,
    format_id: Option<String>,
    filesize: Option<u64>,
    filesize_approx: Option<u64>,
    vcodec: Option<String>,
    acodec: Option<String>,
}

fn stream_kind(vcodec: Option<&str>, acodec: Option<&str>) -> MediaKind {
    match vcodec {
        Some(v) if v != "none" && !v.is_empty() => MediaKind::Video,
        _ => match acodec {
            Some(a) if a != "none" && !a.is_empty() => MediaKind::Audio,
            // Neither codec reported: assume video, the safer default for
            // size warnings.
            _ => MediaKind::Video,
        },
    }
}

/// Decode a `--dump-json` payload. yt-dlp emits one JSON object per line;
/// with `--no-playlist` we only ever care about the first.
fn parse_resolution(stdout: &str) -> Result<Resolution, EngineError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or(EngineError::NotFound)?;

    let info: RawInfo =
        serde_json::from_str(line).map_err(|e| EngineError::Parse(e.to_string()))?;

    let title = info.title.unwrap_or_default();
    let ext = info.ext.unwrap_or_default();

    let mut streams = Vec::new();
    let mut needs_mux = false;

    match info.requested_formats {
        Some(formats) if !formats.is_empty() => {
            for f in &formats {
                let Some(url) = f.url.as_deref().filter(|u| !u.is_empty()) else {
                    warn!("skipping requested format without URL");
                    continue;
                };
                streams.push(EngineStream {
                    url: url.to_string(),
                    ext: f.ext.clone().unwrap_or_else(|| ext.clone()),
                    format_id: f.format_id.clone().unwrap_or_default(),
                    approx_size: f.filesize.or(f.filesize_approx).unwrap_or(0),
                    kind: stream_kind(f.vcodec.as_deref(), f.acodec.as_deref()),
                });
            }
            needs_mux = streams.len() > 1;
        }
        _ => {
            if let Some(url) = info.url.as_deref().filter(|u| !u.is_empty()) {
                streams.push(EngineStream {
                    url: url.to_string(),
                    ext: ext.clone(),
                    format_id: info.format_id.unwrap_or_default(),
                    approx_size: info.filesize.or(info.filesize_approx).unwrap_or(0),
                    kind: stream_kind(info.vcodec.as_deref(), info.acodec.as_deref()),
                });
            }
        }
    }

    if streams.is_empty() {
        return Err(EngineError::NotFound);
    }

    Ok(Resolution {
        title,
        ext,
        needs_mux,
        streams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn single_stream_payload() {
        let raw = r#"{"title":"A Song","ext":"m4a","url":"https://cdn.example/a.m4a",
            "format_id":"140","filesize":3145728,"vcodec":"none","acodec":"mp4a.40.2"}"#
            .replace('\n', "");

        let res = parse_resolution(&raw).unwrap();
        assert_eq!(res.title, "A Song");
        assert_eq!(res.ext, "m4a");
        assert!(!res.needs_mux);
        assert_eq!(res.streams.len(), 1);
        assert_eq!(res.streams[0].kind, MediaKind::Audio);
        assert_eq!(res.streams[0].approx_size, 3_145_728);
    }

    #[test]
    fn merged_formats_need_muxing() {
        let raw = r#"{"title":"A Video","ext":"mp4","requested_formats":[
            {"url":"https://cdn.example/v.mp4","ext":"mp4","format_id":"137",
             "filesize":52428800,"vcodec":"avc1.640028","acodec":"none"},
            {"url":"https://cdn.example/a.m4a","ext":"m4a","format_id":"140",
             "filesize_approx":4194304,"vcodec":"none","acodec":"mp4a.40.2"}]}"#
            .replace('\n', "");

        let res = parse_resolution(&raw).unwrap();
        assert!(res.needs_mux);
        assert_eq!(res.streams.len(), 2);
        assert_eq!(res.streams[0].kind, MediaKind::Video);
        assert_eq!(res.streams[1].kind, MediaKind::Audio);
        assert_eq!(res.streams[1].approx_size, 4_194_304);
    }

    #[test]
    fn missing_urls_mean_not_found() {
        let raw = r#"{"title":"No Streams","ext":"mp4"}"#;
        assert_matches!(parse_resolution(raw), Err(EngineError::NotFound));
    }

    #[test]
    fn empty_output_means_not_found() {
        assert_matches!(parse_resolution("\n  \n"), Err(EngineError::NotFound));
    }

    #[test]
    fn garbage_output_is_a_parse_error() {
        assert_matches!(parse_resolution("not json"), Err(EngineError::Parse(_)));
    }

    #[test]
    fn extraction_message_prefers_error_lines() {
        let stderr = "WARNING: something\nERROR: Video unavailable\n";
        assert_eq!(extraction_message(stderr), "Video unavailable");
    }

    #[test]
    fn extraction_message_falls_back_to_last_line() {
        let stderr = "Traceback (most recent call last):\n  boom\n";
        assert_eq!(extraction_message(stderr), "boom");
    }

    #[test]
    fn unknown_codecs_default_to_video() {
        assert_eq!(stream_kind(None, None), MediaKind::Video);
        assert_eq!(stream_kind(Some("none"), Some("opus")), MediaKind::Audio);
        assert_eq!(stream_kind(Some("vp9"), Some("none")), MediaKind::Video);
    }
}
