//! Shared utility functions.

use crate::types::{ChannelId, VideoId};
use once_cell::sync::Lazy;
use regex::Regex;

static VIDEO_ID_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?:[?&]v=|youtu\.be/)([A-Za-z0-9_-]{11})").ok());

/// Extracts the 11-character video id from a `watch?v=` or `youtu.be/` URL.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    let re = VIDEO_ID_RE.as_ref()?;
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId(m.as_str().to_string()))
}

/// Channel id taken from the trailing path segment of a channel URL.
///
/// Returns the empty id when no segment is available.
pub fn channel_id_from_url(url: Option<&str>) -> ChannelId {
    let Some(url) = url else {
        return ChannelId::default();
    };
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let segment = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    if segment.is_empty() || segment.contains(':') || segment.contains('.') {
        return ChannelId::default();
    }
    ChannelId(segment.to_string())
}

/// Trims, lowercases and collapses internal whitespace runs to one space.
pub fn normalize_whitespace(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
