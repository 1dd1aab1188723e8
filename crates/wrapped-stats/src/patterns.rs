//! Monthly, weekly and hourly viewing patterns.

use crate::duration::parse_duration_hours;
use crate::traits::Aggregator;
use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use wrapped_common::WatchHistoryEntry;
use wrapped_config::DEFAULT_TIMEZONE_OFFSET_HOURS;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

/// English name of a 1-based month; empty for out-of-range input.
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
        .unwrap_or_default()
}

/// Watch time for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// 1 = January.
    pub month: u32,
    /// English month name.
    pub name: String,
    /// Summed watch time.
    pub watch_time_hours: f64,
    /// Entries in the month.
    pub video_count: u32,
}

/// Watch time for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayBucket {
    /// 0 = Sunday.
    pub weekday: u32,
    /// English weekday name.
    pub name: String,
    /// Summed watch time.
    pub watch_time_hours: f64,
    /// Entries on this weekday.
    pub video_count: u32,
    /// Mean minutes per entry on this weekday.
    pub average_minutes: f64,
}

/// Watch time for one hour of the day, after the timezone shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourBucket {
    /// 0-23.
    pub hour: u32,
    /// Summed watch time.
    pub watch_time_hours: f64,
    /// Entries in this hour.
    pub video_count: u32,
    /// Mean minutes per entry in this hour.
    pub average_minutes: f64,
}

/// All three series for a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewingPatterns {
    /// Twelve buckets, January first.
    pub monthly: Vec<MonthBucket>,
    /// Seven buckets, Sunday first.
    pub weekly: Vec<WeekdayBucket>,
    /// Twenty-four buckets, midnight first.
    pub hourly: Vec<HourBucket>,
}

fn average_minutes(hours: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        hours / f64::from(count) * 60.0
    }
}

/// Aggregator for time-of-use patterns
#[derive(Debug, Clone)]
pub struct PatternAggregator {
    timezone_offset_hours: i32,
}

impl PatternAggregator {
    /// Create an aggregator using the default timezone offset
    pub fn new() -> Self {
        Self::with_offset(DEFAULT_TIMEZONE_OFFSET_HOURS)
    }

    /// Shift timestamps by `timezone_offset_hours` before bucketing
    pub fn with_offset(timezone_offset_hours: i32) -> Self {
        Self {
            timezone_offset_hours,
        }
    }

    /// 12 buckets, January first.
    pub fn monthly(&self, entries: &[WatchHistoryEntry]) -> Vec<MonthBucket> {
        let mut buckets = [(0.0_f64, 0_u32); 12];
        for entry in entries {
            let bucket = &mut buckets[entry.time_watched.month0() as usize];
            bucket.0 += parse_duration_hours(&entry.duration);
            bucket.1 += 1;
        }
        buckets
            .iter()
            .zip(1u32..)
            .map(|(&(hours, count), month)| MonthBucket {
                month,
                name: month_name(month).to_string(),
                watch_time_hours: hours,
                video_count: count,
            })
            .collect()
    }

    /// 7 buckets, Sunday first.
    pub fn weekly(&self, entries: &[WatchHistoryEntry]) -> Vec<WeekdayBucket> {
        let mut buckets = [(0.0_f64, 0_u32); 7];
        for entry in entries {
            let idx = entry.time_watched.weekday().num_days_from_sunday() as usize;
            buckets[idx].0 += parse_duration_hours(&entry.duration);
            buckets[idx].1 += 1;
        }
        buckets
            .iter()
            .zip(0u32..)
            .map(|(&(hours, count), weekday)| WeekdayBucket {
                weekday,
                name: WEEKDAY_NAMES[weekday as usize].to_string(),
                watch_time_hours: hours,
                video_count: count,
                average_minutes: average_minutes(hours, count),
            })
            .collect()
    }

    /// Shifts a UTC hour by the configured offset into 0..24.
    pub fn shifted_hour(&self, utc_hour: u32) -> u32 {
        let shifted = i64::from(utc_hour) + i64::from(self.timezone_offset_hours);
        // rem_euclid keeps the result in 0..24
        u32::try_from(shifted.rem_euclid(24)).unwrap_or_default()
    }

    /// 24 buckets, midnight first.
    pub fn hourly(&self, entries: &[WatchHistoryEntry]) -> Vec<HourBucket> {
        let mut buckets = [(0.0_f64, 0_u32); 24];
        for entry in entries {
            let idx = self.shifted_hour(entry.time_watched.hour()) as usize;
            buckets[idx].0 += parse_duration_hours(&entry.duration);
            buckets[idx].1 += 1;
        }
        buckets
            .iter()
            .zip(0u32..)
            .map(|(&(hours, count), hour)| HourBucket {
                hour,
                watch_time_hours: hours,
                video_count: count,
                average_minutes: average_minutes(hours, count),
            })
            .collect()
    }
}

impl Default for PatternAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator for PatternAggregator {
    type Output = ViewingPatterns;

    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    fn aggregate(&self, entries: &[WatchHistoryEntry]) -> ViewingPatterns {
        let patterns = ViewingPatterns {
            monthly: self.monthly(entries),
            weekly: self.weekly(entries),
            hourly: self.hourly(entries),
        };
        debug!(offset = self.timezone_offset_hours, "Aggregated viewing patterns");
        patterns
    }

    fn name(&self) -> &'static str {
        "patterns"
    }
}
