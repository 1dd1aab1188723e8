//! Configuration schema definitions.
//!
//! Every section is optional in the source file; missing sections and fields
//! fall back to the values in [`crate::defaults`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wrapped_common::{LogFormat, LoggingConfig};

/// Main configuration structure for YouTube Wrapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archive store configuration.
    pub archive: ArchiveConfig,
    /// Metadata enrichment configuration.
    pub enrichment: EnrichmentConfig,
    /// Aggregation tuning.
    pub aggregation: AggregationConfig,
    /// In-process cache sizing.
    pub cache: CacheConfig,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Archive store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Root directory holding one sub-directory per user.
    pub data_dir: PathBuf,
}

/// Metadata enrichment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Whether enrichment may call the remote API.
    pub enabled: bool,
    /// YouTube Data API key.
    pub api_key: Option<String>,
    /// Base URL of the YouTube Data API.
    pub base_url: String,
    /// Number of video ids per request (1..=50).
    pub batch_size: usize,
    /// Request rate limit.
    pub requests_per_second: u32,
    /// Per-request timeout.
    pub timeout_seconds: u64,
    /// Directory of the compressed metadata cache; in-memory when unset.
    pub cache_dir: Option<PathBuf>,
}

/// Aggregation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Largest gap between consecutive entries of one session.
    pub session_gap_minutes: u32,
    /// Cumulative watch-time threshold for the hours milestone.
    pub milestone_hours: f64,
    /// Fixed offset applied to hourly buckets (-12..=14).
    pub timezone_offset_hours: i32,
    /// Number of categories kept in the top list.
    pub top_categories: usize,
    /// Number of creators kept in the top list.
    pub top_creators: usize,
    /// Number of tags kept in the frequency list.
    pub top_tags: usize,
    /// Number of most-rewatched videos kept per category.
    pub top_videos_per_category: usize,
}

/// In-process cache sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live of computed yearly aggregates.
    pub aggregate_ttl_seconds: u64,
    /// Maximum number of cached aggregates.
    pub aggregate_capacity: u64,
    /// Maximum number of cached channel thumbnails.
    pub thumbnail_capacity: u64,
}

/// Logging configuration as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level filter directive.
    pub level: String,
    /// Emit JSON instead of compact text.
    pub json: bool,
    /// Directory for daily-rotated log files.
    pub file: Option<PathBuf>,
}

impl LoggingSettings {
    /// Converts to the runtime logging configuration.
    pub fn to_logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.level.clone(),
            format: if self.json {
                LogFormat::Json
            } else {
                LogFormat::Compact
            },
            file_dir: self.file.clone(),
            ..LoggingConfig::default()
        }
    }
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> wrapped_common::Result<()> {
        crate::validator::ConfigValidator::validate(self)
    }
}
