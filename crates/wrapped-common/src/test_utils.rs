//! Test utilities and shared test helpers for YouTube Wrapped.
//!
//! This module provides fixtures and helper functions used across all crates
//! in the workspace for unit and integration testing. It is compiled for the
//! crate's own tests and for dependents that enable the `testing` feature.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging for tests. Safe to call multiple times.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Test fixture for creating a UTC timestamp.
pub fn mock_timestamp(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("valid test timestamp")
}

/// Create a temporary directory for tests that automatically cleans up.
#[cfg(any(test, feature = "tempfile"))]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

/// Watch-history fixtures.
pub mod entry_fixtures {
    use super::mock_timestamp;
    use crate::types::{VideoId, WatchHistoryEntry};
    use chrono::{DateTime, Utc};

    /// Builder for enriched entries.
    #[derive(Debug, Clone)]
    pub struct EntryBuilder {
        entry: WatchHistoryEntry,
    }

    impl EntryBuilder {
        /// Starts an entry watched at `time`.
        pub fn at(time: DateTime<Utc>) -> Self {
            Self {
                entry: WatchHistoryEntry::new("Test video", time),
            }
        }

        /// Sets the title.
        pub fn title(mut self, title: &str) -> Self {
            self.entry.title = title.to_string();
            self
        }

        /// Sets the video id.
        pub fn video(mut self, id: &str) -> Self {
            self.entry.video_id = Some(VideoId::from(id));
            self
        }

        /// Sets the ISO-8601 duration.
        pub fn duration(mut self, duration: &str) -> Self {
            self.entry.duration = duration.to_string();
            self
        }

        /// Sets the category id.
        pub fn category(mut self, id: u32) -> Self {
            self.entry.category_id = Some(id);
            self
        }

        /// Sets the channel name and a channel URL derived from `channel_id`.
        pub fn channel(mut self, name: &str, channel_id: &str) -> Self {
            self.entry.channel_name = Some(name.to_string());
            self.entry.channel_url = Some(format!("https://www.youtube.com/channel/{channel_id}"));
            self
        }

        /// Sets the tags.
        pub fn tags(mut self, tags: &[&str]) -> Self {
            self.entry.tags = Some(tags.iter().map(ToString::to_string).collect());
            self
        }

        /// Finishes the entry.
        pub fn build(self) -> WatchHistoryEntry {
            self.entry
        }
    }

    /// A small enriched year: two creators, three categories, spread over
    /// several months and weekdays.
    pub fn sample_year_entries(year: i32) -> Vec<WatchHistoryEntry> {
        vec![
            EntryBuilder::at(mock_timestamp(year, 1, 5, 18, 0, 0))
                .title("Speedrun highlights")
                .video("aaaaaaaaaaa")
                .duration("PT1H")
                .category(20)
                .channel("GameChannel", "UCgame")
                .tags(&["Minecraft", "speedrun"])
                .build(),
            EntryBuilder::at(mock_timestamp(year, 1, 5, 19, 5, 0))
                .title("Speedrun highlights")
                .video("aaaaaaaaaaa")
                .duration("PT30M")
                .category(20)
                .channel("GameChannel", "UCgame")
                .tags(&["minecraft"])
                .build(),
            EntryBuilder::at(mock_timestamp(year, 3, 12, 8, 0, 0))
                .title("Morning lecture")
                .video("bbbbbbbbbbb")
                .duration("PT45M")
                .category(27)
                .channel("LearnDaily", "UClearn")
                .tags(&["Education", "math"])
                .build(),
            EntryBuilder::at(mock_timestamp(year, 6, 20, 21, 30, 0))
                .title("Live set")
                .video("ccccccccccc")
                .duration("PT15M")
                .category(10)
                .channel("LearnDaily", "UClearn")
                .build(),
        ]
    }

    /// A minimal Takeout `watch-history.json` document.
    pub fn takeout_json() -> &'static str {
        r#"[
  {
    "header": "YouTube",
    "title": "Watched Speedrun highlights",
    "titleUrl": "https://www.youtube.com/watch?v=aaaaaaaaaaa",
    "subtitles": [{"name": "GameChannel", "url": "https://www.youtube.com/channel/UCgame"}],
    "time": "2023-01-05T18:00:00.000Z"
  },
  {
    "header": "YouTube",
    "title": "Watched Morning lecture",
    "titleUrl": "https://youtu.be/bbbbbbbbbbb",
    "subtitles": [{"name": "LearnDaily", "url": "https://www.youtube.com/channel/UClearn"}],
    "time": "2024-03-12T08:00:00Z"
  },
  {
    "header": "YouTube",
    "title": "Watched a video that has been removed",
    "titleUrl": "https://www.youtube.com/watch?v=ccccccccccc",
    "time": "2024-06-20T21:30:00Z"
  },
  {
    "header": "YouTube",
    "title": "Watched Missing time"
  }
]"#
    }
}

/// Configuration-related test utilities.
pub mod config_fixtures {
    /// Create a minimal valid configuration as YAML string.
    pub fn minimal_config_yaml() -> &'static str {
        r#"
archive:
  data_dir: "./data"
"#
    }

    /// Create a full configuration as YAML string.
    pub fn full_config_yaml() -> &'static str {
        concat!(
            "archive:\n",
            "  data_dir: \"/var/lib/yt-wrapped\"\n",
            "\n",
            "enrichment:\n",
            "  enabled: true\n",
            "  api_key: \"test_api_key\"\n",
            "  base_url: \"https://www.googleapis.com/youtube/v3\"\n",
            "  batch_size: 25\n",
            "  requests_per_second: 5\n",
            "  timeout_seconds: 10\n",
            "  cache_dir: \"/var/cache/yt-wrapped\"\n",
            "\n",
            "aggregation:\n",
            "  session_gap_minutes: 45\n",
            "  milestone_hours: 100\n",
            "  timezone_offset_hours: 2\n",
            "  top_categories: 5\n",
            "  top_creators: 5\n",
            "  top_tags: 100\n",
            "  top_videos_per_category: 3\n",
            "\n",
            "cache:\n",
            "  aggregate_ttl_seconds: 600\n",
            "  aggregate_capacity: 16\n",
            "  thumbnail_capacity: 100\n",
            "\n",
            "logging:\n",
            "  level: \"debug\"\n",
            "  json: true\n",
        )
    }
}

/// Property-based testing utilities using proptest.
#[cfg(any(test, feature = "proptest"))]
pub mod property_testing {
    use proptest::prelude::*;

    /// Strategy for well-formed ISO-8601 durations, yielding the string and
    /// its expected hours.
    pub fn duration_strategy() -> impl Strategy<Value = (String, f64)> {
        (
            proptest::option::of(0u32..200),
            proptest::option::of(0u32..60),
            proptest::option::of(0u32..60),
        )
            .prop_map(|(h, m, s)| {
                let mut text = String::from("PT");
                let mut hours = 0.0;
                if let Some(h) = h {
                    text.push_str(&format!("{h}H"));
                    hours += f64::from(h);
                }
                if let Some(m) = m {
                    text.push_str(&format!("{m}M"));
                    hours += f64::from(m) / 60.0;
                }
                if let Some(s) = s {
                    text.push_str(&format!("{s}S"));
                    hours += f64::from(s) / 3600.0;
                }
                (text, hours)
            })
    }

    /// Strategy for raw tag strings with irregular case and whitespace.
    pub fn raw_tag_strategy() -> impl Strategy<Value = String> {
        r"[ \t]{0,2}[A-Za-z]{1,8}([ \t]{1,3}[A-Za-z]{1,8})?[ \t]{0,2}".prop_map(|s| s.to_string())
    }

    /// Strategy for user id strings accepted by `UserId::try_new`.
    pub fn user_id_strategy() -> impl Strategy<Value = String> {
        r"[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,31}".prop_map(|s| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_init_logging_multiple_calls() {
        init_test_logging();
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_mock_timestamp() {
        let timestamp = mock_timestamp(2024, 1, 1, 12, 0, 0);
        assert_eq!(timestamp.year(), 2024);
        assert_eq!(timestamp.month(), 1);
        assert_eq!(timestamp.day(), 1);
        assert_eq!(timestamp.hour(), 12);
    }

    #[test]
    fn test_assert_approx_eq() {
        assert_approx_eq(1.0, 1.0001, 0.001);
        assert_approx_eq(1.0, 0.9999, 0.001);
    }

    #[test]
    #[should_panic]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq(1.0, 1.1, 0.05);
    }

    #[test]
    fn test_sample_year_entries() {
        let entries = entry_fixtures::sample_year_entries(2023);
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.year() == 2023));
        assert!(entries.iter().all(|e| e.is_enriched()));
    }

    mod property_tests {
        use super::super::property_testing;
        use crate::types::UserId;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_property_user_id_accepted(id in property_testing::user_id_strategy()) {
                prop_assert!(UserId::try_new(id).is_ok());
            }

            #[test]
            fn test_property_duration_strategy_prefix((text, hours) in property_testing::duration_strategy()) {
                prop_assert!(text.starts_with("PT"));
                prop_assert!(hours >= 0.0);
            }
        }
    }
}
