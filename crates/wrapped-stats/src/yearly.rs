//! Yearly aggregate assembly and validation.

use crate::categories::{CategoryAggregator, CategoryComparison, CategoryStat};
use crate::creators::{CreatorAffinity, CreatorAggregator, CreatorStat};
use crate::duration::parse_duration_hours;
use crate::patterns::{HourBucket, MonthBucket, PatternAggregator, WeekdayBucket};
use crate::sessions::{MilestoneDetector, Milestones};
use crate::tags::{TagExtractor, TagFrequency};
use crate::traits::Aggregator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use wrapped_common::{Result, WatchHistoryEntry, WrappedError};
use wrapped_config::AggregationConfig;

/// Category comparison against an earlier year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearComparison {
    /// Year compared against.
    pub previous_year: i32,
    /// Largest changes first.
    pub categories: Vec<CategoryComparison>,
}

/// Everything shown for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyAggregate {
    /// Calendar year.
    pub year: i32,
    /// Summed watch time of every entry.
    pub total_watch_time_hours: f64,
    /// Entries in the year.
    pub video_count: usize,
    /// Distinct channel names.
    pub unique_creators: usize,
    /// Largest categories by watch time.
    pub top_categories: Vec<CategoryStat>,
    /// Largest creators by watch time.
    pub top_creators: Vec<CreatorStat>,
    /// Category mix of the top creators.
    pub creator_affinity: Vec<CreatorAffinity>,
    /// Per-month series.
    pub monthly: Vec<MonthBucket>,
    /// Per-weekday series.
    pub weekly: Vec<WeekdayBucket>,
    /// Per-hour series.
    pub hourly: Vec<HourBucket>,
    /// Yearly highlights.
    pub milestones: Milestones,
    /// Most frequent tags.
    pub tags: Vec<TagFrequency>,
    /// Present when a comparison year was requested.
    pub comparison: Option<YearComparison>,
    /// When the aggregate was computed.
    pub generated_at: DateTime<Utc>,
}

fn check_finite(value: f64, field: &str) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(WrappedError::validation_field(
            format!("{field} must be a finite, non-negative number, got {value}"),
            field,
        ))
    }
}

fn check_len(len: usize, max: usize, field: &str) -> Result<()> {
    if len <= max {
        Ok(())
    } else {
        Err(WrappedError::validation_field(
            format!("{field} has {len} items, at most {max} allowed"),
            field,
        ))
    }
}

fn check_exact_len(len: usize, expected: usize, field: &str) -> Result<()> {
    if len == expected {
        Ok(())
    } else {
        Err(WrappedError::validation_field(
            format!("{field} has {len} buckets, expected {expected}"),
            field,
        ))
    }
}

impl YearlyAggregate {
    /// Checks the aggregate before it is cached or serialized.
    ///
    /// Rejects non-finite or negative numbers, top lists longer than the
    /// configured limits, and series with the wrong number of buckets.
    pub fn validate(&self, limits: &AggregationConfig) -> Result<()> {
        check_finite(self.total_watch_time_hours, "total_watch_time_hours")?;

        check_len(self.top_categories.len(), limits.top_categories, "top_categories")?;
        for category in &self.top_categories {
            check_finite(category.watch_time_hours, "top_categories.watch_time_hours")?;
            check_finite(category.percentage, "top_categories.percentage")?;
            check_len(
                category.top_videos.len(),
                limits.top_videos_per_category,
                "top_categories.top_videos",
            )?;
        }

        check_len(self.top_creators.len(), limits.top_creators, "top_creators")?;
        for creator in &self.top_creators {
            check_finite(creator.watch_time_hours, "top_creators.watch_time_hours")?;
        }
        check_len(self.creator_affinity.len(), limits.top_creators, "creator_affinity")?;
        for share in self.creator_affinity.iter().flat_map(|a| &a.categories) {
            check_finite(share.percentage, "creator_affinity.percentage")?;
        }

        check_exact_len(self.monthly.len(), 12, "monthly")?;
        check_exact_len(self.weekly.len(), 7, "weekly")?;
        check_exact_len(self.hourly.len(), 24, "hourly")?;
        for value in self
            .monthly
            .iter()
            .map(|m| m.watch_time_hours)
            .chain(self.weekly.iter().map(|w| w.average_minutes))
            .chain(self.hourly.iter().map(|h| h.average_minutes))
        {
            check_finite(value, "patterns")?;
        }

        if let Some(month) = &self.milestones.most_active_month {
            if !month.percent_above_average.is_finite() {
                return Err(WrappedError::validation_field(
                    "most_active_month.percent_above_average must be finite",
                    "milestones",
                ));
            }
        }

        check_len(self.tags.len(), limits.top_tags, "tags")?;

        if let Some(comparison) = &self.comparison {
            check_len(comparison.categories.len(), limits.top_categories, "comparison")?;
            if comparison.categories.iter().any(|c| !c.change.is_finite()) {
                return Err(WrappedError::validation_field(
                    "comparison change must be finite",
                    "comparison",
                ));
            }
        }

        Ok(())
    }
}

/// Composes the individual aggregators into a [`YearlyAggregate`].
#[derive(Debug, Clone)]
pub struct YearlyAggregator {
    categories: CategoryAggregator,
    creators: CreatorAggregator,
    milestones: MilestoneDetector,
    patterns: PatternAggregator,
    tags: TagExtractor,
}

impl YearlyAggregator {
    /// Build the aggregators from configured limits and settings
    pub fn new(config: &AggregationConfig) -> Self {
        Self {
            categories: CategoryAggregator::with_limits(
                config.top_categories,
                config.top_videos_per_category,
            ),
            creators: CreatorAggregator::with_limit(config.top_creators),
            milestones: MilestoneDetector::with_settings(
                config.session_gap_minutes,
                config.milestone_hours,
            ),
            patterns: PatternAggregator::with_offset(config.timezone_offset_hours),
            tags: TagExtractor::with_limit(config.top_tags),
        }
    }

    /// Aggregates one year, comparing categories with `previous` when given.
    #[instrument(skip(self, entries, previous), fields(entries = entries.len()))]
    pub fn aggregate(
        &self,
        year: i32,
        entries: &[WatchHistoryEntry],
        previous: Option<(i32, &[WatchHistoryEntry])>,
    ) -> YearlyAggregate {
        let total_watch_time_hours = entries
            .iter()
            .map(|entry| parse_duration_hours(&entry.duration))
            .sum();
        let top_categories = self.categories.aggregate(entries);
        let patterns = self.patterns.aggregate(entries);
        let tag_summary = self.tags.aggregate(entries);

        let comparison = previous.map(|(previous_year, previous_entries)| {
            let previous_top = self.categories.aggregate(previous_entries);
            YearComparison {
                previous_year,
                categories: self.categories.compare(&top_categories, &previous_top),
            }
        });

        let aggregate = YearlyAggregate {
            year,
            total_watch_time_hours,
            video_count: entries.len(),
            unique_creators: CreatorAggregator::unique_creators(entries),
            top_categories,
            top_creators: self.creators.aggregate(entries),
            creator_affinity: self.creators.affinity(entries),
            monthly: patterns.monthly,
            weekly: patterns.weekly,
            hourly: patterns.hourly,
            milestones: self.milestones.aggregate(entries),
            tags: tag_summary.tags,
            comparison,
            generated_at: Utc::now(),
        };

        info!(
            year,
            videos = aggregate.video_count,
            hours = aggregate.total_watch_time_hours,
            tag_failures = tag_summary.failures,
            "Aggregated year"
        );
        aggregate
    }
}

impl Default for YearlyAggregator {
    fn default() -> Self {
        Self::new(&AggregationConfig::default())
    }
}
