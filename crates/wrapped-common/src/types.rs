//! Common type definitions and newtype wrappers for domain modeling.

use crate::error::{Result, WrappedError};
use chrono::{DateTime, Datelike, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of the user whose archive is being read.
///
/// The id doubles as a directory name in file-backed stores, so it is
/// restricted to ASCII alphanumerics, `-`, `_` and `.` and may not start
/// with a dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Maximum accepted id length.
    pub const MAX_LEN: usize = 128;

    /// Creates a validated user id.
    pub fn try_new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > Self::MAX_LEN {
            return Err(WrappedError::validation_field(
                format!("user id must be 1-{} characters", Self::MAX_LEN),
                "user",
            ));
        }
        if id.starts_with('.') {
            return Err(WrappedError::validation_field(
                "user id may not start with '.'",
                "user",
            ));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(WrappedError::validation_field(
                "user id may only contain letters, digits, '-', '_' and '.'",
                "user",
            ));
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = WrappedError;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_new(s)
    }
}

/// An 11-character YouTube video id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A YouTube channel id. The empty id means "unknown channel".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is the empty placeholder id.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One watch event reconstructed from an exported archive.
///
/// Metadata fields are only present for enriched years. They deserialize
/// leniently: a wrongly typed value is read as absent instead of failing the
/// whole year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchHistoryEntry {
    /// Video title with the "Watched " prefix removed.
    pub title: String,
    /// Id parsed from the video URL.
    #[serde(default, deserialize_with = "lenient")]
    pub video_id: Option<VideoId>,
    /// Channel name, absent for removed videos.
    #[serde(default, deserialize_with = "lenient")]
    pub channel_name: Option<String>,
    /// Channel URL, absent for removed videos.
    #[serde(default, deserialize_with = "lenient")]
    pub channel_url: Option<String>,
    /// When the video was watched.
    pub time_watched: DateTime<Utc>,
    /// YouTube category id.
    #[serde(default, deserialize_with = "lenient")]
    pub category_id: Option<u32>,
    /// ISO-8601 duration such as `PT4M13S`; empty when unknown.
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,
    /// `None` when the field is missing or is not an array of strings.
    #[serde(default, deserialize_with = "lenient")]
    pub tags: Option<Vec<String>>,
    /// View count at enrichment time.
    #[serde(default, deserialize_with = "lenient")]
    pub view_count: Option<u64>,
    /// Like count at enrichment time.
    #[serde(default, deserialize_with = "lenient")]
    pub like_count: Option<u64>,
    /// Comment count at enrichment time.
    #[serde(default, deserialize_with = "lenient")]
    pub comment_count: Option<u64>,
    /// Audience flag.
    #[serde(default, deserialize_with = "lenient")]
    pub made_for_kids: Option<bool>,
    /// Upload time.
    #[serde(default, deserialize_with = "lenient")]
    pub published_at: Option<DateTime<Utc>>,
}

impl WatchHistoryEntry {
    /// Creates an entry without any metadata.
    pub fn new(title: impl Into<String>, time_watched: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            video_id: None,
            channel_name: None,
            channel_url: None,
            time_watched,
            category_id: None,
            duration: String::new(),
            tags: None,
            view_count: None,
            like_count: None,
            comment_count: None,
            made_for_kids: None,
            published_at: None,
        }
    }

    /// Calendar year (UTC) the entry was watched in.
    pub fn year(&self) -> i32 {
        self.time_watched.year()
    }

    /// Whether enrichment has populated this entry.
    pub fn is_enriched(&self) -> bool {
        self.category_id.is_some() || !self.duration.is_empty()
    }
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::<D, String>(deserializer)?.unwrap_or_default())
}

/// Outcome of a computation the presentation layer may have to replace with
/// placeholder data.
#[derive(Debug, Clone, PartialEq)]
pub enum Availability<T> {
    /// The computation succeeded.
    Ready(T),
    /// The computation could not run; `reason` is shown as a passive notice.
    Unavailable {
        /// Why the value could not be produced.
        reason: String,
    },
}

impl<T> Availability<T> {
    /// Converts a result, keeping the error message as the reason.
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Unavailable {
                reason: err.to_string(),
            },
        }
    }

    /// Whether data is available.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The reason data is unavailable, if it is.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }

    /// Returns the data, discarding the reason.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    /// Maps the ready value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Availability<U> {
        match self {
            Self::Ready(value) => Availability::Ready(f(value)),
            Self::Unavailable { reason } => Availability::Unavailable { reason },
        }
    }

    /// Returns the ready value or builds a fallback from the reason.
    pub fn unwrap_or_else(self, fallback: impl FnOnce(&str) -> T) -> T {
        match self {
            Self::Ready(value) => value,
            Self::Unavailable { reason } => fallback(&reason),
        }
    }
}

impl<T> From<Result<T>> for Availability<T> {
    fn from(result: Result<T>) -> Self {
        Self::from_result(result)
    }
}
