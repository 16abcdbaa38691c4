//! Format selection expressions.
//!
//! Builds the provider format-selection expression for a resolution request.
//! [`build`] is pure and deterministic: identical inputs always yield the
//! same string, which lets the expression's inputs double as part of the
//! response-cache fingerprint.

use crate::model::MediaKind;

/// Sentinel value some clients send when no real override was picked.
const CUSTOM_SENTINEL: &str = "custom";

/// Maximum stream height considered for video requests.
const MAX_HEIGHT: u32 = 1080;

/// Build a format-selection expression.
///
/// Every alternative in the fallback chain carries a trailing filter
/// restricting the protocol to HTTP(S), excluding DASH and capping the
/// upstream filesize at `filesize_cap_mb` megabytes, so the returned
/// expression always ends with that filter.
pub fn build(
    kind: MediaKind,
    has_muxer: bool,
    custom_format: Option<&str>,
    filesize_cap_mb: u64,
) -> String {
    let filter = format!("[protocol^=http][protocol!*=dash][filesize<={filesize_cap_mb}M]");

    let mut alternatives: Vec<String> = Vec::with_capacity(5);

    // A real custom override wins over everything else.
    if let Some(custom) = custom_format {
        let custom = custom.trim();
        if !custom.is_empty() && custom != CUSTOM_SENTINEL {
            alternatives.push(custom.to_string());
        }
    }

    match (kind, has_muxer) {
        (MediaKind::Video, true) => {
            alternatives.push(format!("bestvideo[height<={MAX_HEIGHT}]+bestaudio"));
            alternatives.push(format!("bestvideo[height<={MAX_HEIGHT}]"));
            alternatives.push("best".to_string());
        }
        (MediaKind::Video, false) => {
            // No muxer available: the stream must already carry both codecs.
            alternatives.push(format!(
                "best[height<={MAX_HEIGHT}][vcodec!=none][acodec!=none]"
            ));
        }
        (MediaKind::Audio, _) => {
            alternatives.push("bestaudio[ext=mp3]".to_string());
            alternatives.push("bestaudio[ext=m4a]".to_string());
            alternatives.push("bestaudio[ext=webm]".to_string());
            alternatives.push("bestaudio".to_string());
        }
    }

    alternatives
        .iter()
        .map(|alt| format!("{alt}{filter}"))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILTER: &str = "[protocol^=http][protocol!*=dash][filesize<=200M]";

    #[test]
    fn build_is_deterministic() {
        let a = build(MediaKind::Audio, false, Some("251"), 200);
        let b = build(MediaKind::Audio, false, Some("251"), 200);
        assert_eq!(a, b);
    }

    #[test]
    fn every_expression_ends_with_filter() {
        let cases = [
            build(MediaKind::Audio, false, None, 200),
            build(MediaKind::Audio, true, Some("custom"), 200),
            build(MediaKind::Video, true, None, 200),
            build(MediaKind::Video, false, Some("137+140"), 200),
        ];
        for expr in cases {
            assert!(expr.ends_with(FILTER), "missing filter suffix: {expr}");
        }
    }

    #[test]
    fn audio_fallback_order() {
        let expr = build(MediaKind::Audio, false, None, 200);
        assert_eq!(
            expr,
            format!(
                "bestaudio[ext=mp3]{FILTER}/bestaudio[ext=m4a]{FILTER}\
                 /bestaudio[ext=webm]{FILTER}/bestaudio{FILTER}"
            )
        );
    }

    #[test]
    fn video_with_muxer_prefers_split_streams() {
        let expr = build(MediaKind::Video, true, None, 200);
        assert!(expr.starts_with("bestvideo[height<=1080]+bestaudio"));
        assert!(expr.contains("/bestvideo[height<=1080]["));
        assert!(expr.contains("/best["));
    }

    #[test]
    fn video_without_muxer_requires_both_codecs() {
        let expr = build(MediaKind::Video, false, None, 200);
        assert_eq!(
            expr,
            format!("best[height<=1080][vcodec!=none][acodec!=none]{FILTER}")
        );
        assert!(!expr.contains('+'));
    }

    #[test]
    fn custom_format_leads_the_chain() {
        let expr = build(MediaKind::Video, true, Some("137+140"), 200);
        assert!(expr.starts_with(&format!("137+140{FILTER}/")));
    }

    #[test]
    fn custom_sentinel_is_ignored() {
        let with_sentinel = build(MediaKind::Audio, false, Some("custom"), 200);
        let without = build(MediaKind::Audio, false, None, 200);
        assert_eq!(with_sentinel, without);

        let blank = build(MediaKind::Audio, false, Some("   "), 200);
        assert_eq!(blank, without);
    }

    #[test]
    fn filesize_cap_is_configurable() {
        let expr = build(MediaKind::Audio, false, None, 50);
        assert!(expr.ends_with("[protocol^=http][protocol!*=dash][filesize<=50M]"));
    }
}
