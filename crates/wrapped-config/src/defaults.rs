//! Default values.

use crate::schema::*;
use std::path::PathBuf;

/// Default session gap in minutes.
pub const DEFAULT_SESSION_GAP_MINUTES: u32 = 30;
/// Default cumulative-hours milestone.
pub const DEFAULT_MILESTONE_HOURS: f64 = 250.0;
/// Default hourly-bucket offset (UTC-6).
pub const DEFAULT_TIMEZONE_OFFSET_HOURS: i32 = -6;
/// Default top-N for categories and creators.
pub const DEFAULT_TOP_N: usize = 5;
/// Default number of tags kept.
pub const DEFAULT_TOP_TAGS: usize = 250;
/// Default number of rewatched videos kept per category.
pub const DEFAULT_TOP_VIDEOS_PER_CATEGORY: usize = 3;
/// Largest batch the YouTube `videos` endpoint accepts.
pub const MAX_BATCH_SIZE: usize = 50;
/// YouTube Data API v3 base URL.
pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

impl Default for Config {
    fn default() -> Self {
        Self {
            archive: ArchiveConfig::default(),
            enrichment: EnrichmentConfig::default(),
            aggregation: AggregationConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: DEFAULT_YOUTUBE_BASE_URL.to_string(),
            batch_size: MAX_BATCH_SIZE,
            requests_per_second: 10,
            timeout_seconds: 30,
            cache_dir: None,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            session_gap_minutes: DEFAULT_SESSION_GAP_MINUTES,
            milestone_hours: DEFAULT_MILESTONE_HOURS,
            timezone_offset_hours: DEFAULT_TIMEZONE_OFFSET_HOURS,
            top_categories: DEFAULT_TOP_N,
            top_creators: DEFAULT_TOP_N,
            top_tags: DEFAULT_TOP_TAGS,
            top_videos_per_category: DEFAULT_TOP_VIDEOS_PER_CATEGORY,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            aggregate_ttl_seconds: 1800,
            aggregate_capacity: 64,
            thumbnail_capacity: 500,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_defaults() {
        let config = AggregationConfig::default();
        assert_eq!(config.session_gap_minutes, 30);
        assert_eq!(config.milestone_hours, 250.0);
        assert_eq!(config.timezone_offset_hours, -6);
        assert_eq!(config.top_categories, 5);
        assert_eq!(config.top_creators, 5);
        assert_eq!(config.top_tags, 250);
        assert_eq!(config.top_videos_per_category, 3);
    }

    #[test]
    fn test_enrichment_defaults() {
        let config = EnrichmentConfig::default();
        assert_eq!(config.batch_size, 50);
        assert!(config.api_key.is_none());
        assert!(config.base_url.starts_with("https://"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }
}
