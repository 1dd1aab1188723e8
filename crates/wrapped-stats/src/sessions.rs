//! Viewing sessions and yearly milestones.
//!
//! Sessions are built with a small state machine over entries sorted by
//! watch time. An entry joins the open session when it follows the previous
//! entry of that session within the configured gap; otherwise the open
//! session is flushed and a new one starts at the entry.

use crate::duration::parse_duration_hours;
use crate::patterns::month_name;
use crate::traits::{sorted_by_time, Aggregator};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};
use wrapped_common::{VideoId, WatchHistoryEntry};
use wrapped_config::{DEFAULT_MILESTONE_HOURS, DEFAULT_SESSION_GAP_MINUTES};

/// A run of entries with no gap longer than the session gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Watch time of the first entry.
    pub start: DateTime<Utc>,
    /// Watch time of the last entry in the session.
    pub end: DateTime<Utc>,
    /// Summed watch time.
    pub watch_time_hours: f64,
    /// Entries in the session.
    pub video_count: u32,
}

impl Session {
    fn open(entry: &WatchHistoryEntry) -> Self {
        Self {
            start: entry.time_watched,
            end: entry.time_watched,
            watch_time_hours: parse_duration_hours(&entry.duration),
            video_count: 1,
        }
    }

    fn fold(&mut self, entry: &WatchHistoryEntry) {
        self.end = entry.time_watched;
        self.watch_time_hours += parse_duration_hours(&entry.duration);
        self.video_count += 1;
    }
}

enum SessionState {
    Flushed,
    Accumulating(Session),
}

/// Splits a year's entries into sessions.
#[derive(Debug, Clone)]
pub struct SessionDetector {
    gap: Duration,
}

impl SessionDetector {
    /// Create a detector with the default session gap
    pub fn new() -> Self {
        Self::with_gap_minutes(DEFAULT_SESSION_GAP_MINUTES)
    }

    /// Entries at most `minutes` after the previous one stay in the session
    pub fn with_gap_minutes(minutes: u32) -> Self {
        Self {
            gap: Duration::minutes(i64::from(minutes)),
        }
    }

    /// Walks the sessions in chronological order.
    fn walk(&self, entries: &[WatchHistoryEntry], mut on_flush: impl FnMut(Session)) {
        let mut state = SessionState::Flushed;
        for entry in sorted_by_time(entries) {
            state = match state {
                SessionState::Flushed => SessionState::Accumulating(Session::open(entry)),
                SessionState::Accumulating(mut session) => {
                    if entry.time_watched - session.end <= self.gap {
                        session.fold(entry);
                        SessionState::Accumulating(session)
                    } else {
                        on_flush(session);
                        SessionState::Accumulating(Session::open(entry))
                    }
                }
            };
        }
        if let SessionState::Accumulating(session) = state {
            on_flush(session);
        }
    }

    /// All sessions, oldest first.
    pub fn sessions(&self, entries: &[WatchHistoryEntry]) -> Vec<Session> {
        let mut sessions = Vec::new();
        self.walk(entries, |session| sessions.push(session));
        sessions
    }

    /// The session with the largest cumulative watch time.
    ///
    /// A later session replaces the best one only when strictly longer.
    pub fn longest(&self, entries: &[WatchHistoryEntry]) -> Option<Session> {
        let mut best: Option<Session> = None;
        self.walk(entries, |session| {
            if best
                .as_ref()
                .map_or(true, |b| session.watch_time_hours > b.watch_time_hours)
            {
                best = Some(session);
            }
        });
        best
    }
}

impl Default for SessionDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// The calendar day with the most watch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// UTC calendar date.
    pub date: NaiveDate,
    /// Summed watch time.
    pub watch_time_hours: f64,
    /// Entries on the day.
    pub video_count: u32,
}

/// The month with the most watch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthRecord {
    /// 1 = January.
    pub month: u32,
    /// English month name.
    pub name: String,
    /// Summed watch time.
    pub watch_time_hours: f64,
    /// Entries in the month.
    pub video_count: u32,
    /// Increase over the mean of months that have at least one entry.
    pub percent_above_average: f64,
}

/// The point at which cumulative watch time first reached the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoursMilestone {
    /// Threshold that was crossed.
    pub threshold_hours: f64,
    /// Watch time of the entry that crossed it.
    pub reached_at: DateTime<Utc>,
    /// Title of that entry.
    pub video_title: String,
    /// Id of that entry, when known.
    pub video_id: Option<VideoId>,
}

/// Yearly highlights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Milestones {
    /// Day with the most watch time, first seen on ties.
    pub longest_day: Option<DayRecord>,
    /// Month with the most watch time.
    pub most_active_month: Option<MonthRecord>,
    /// Session with the most watch time.
    pub longest_session: Option<Session>,
    /// Absent when the threshold was never reached.
    pub hours_milestone: Option<HoursMilestone>,
}

/// Aggregator for milestones
#[derive(Debug, Clone)]
pub struct MilestoneDetector {
    sessions: SessionDetector,
    threshold_hours: f64,
}

impl MilestoneDetector {
    /// Create a detector with the default gap and threshold
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_SESSION_GAP_MINUTES, DEFAULT_MILESTONE_HOURS)
    }

    /// Use a custom session gap and cumulative-hours threshold
    pub fn with_settings(session_gap_minutes: u32, threshold_hours: f64) -> Self {
        Self {
            sessions: SessionDetector::with_gap_minutes(session_gap_minutes),
            threshold_hours,
        }
    }

    /// Ties go to the earliest date.
    pub fn longest_day(entries: &[WatchHistoryEntry]) -> Option<DayRecord> {
        let mut days: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
        for entry in entries {
            let day = days.entry(entry.time_watched.date_naive()).or_insert((0.0, 0));
            day.0 += parse_duration_hours(&entry.duration);
            day.1 += 1;
        }

        let mut best: Option<DayRecord> = None;
        for (date, (hours, count)) in days {
            if best.as_ref().map_or(true, |b| hours > b.watch_time_hours) {
                best = Some(DayRecord {
                    date,
                    watch_time_hours: hours,
                    video_count: count,
                });
            }
        }
        best
    }

    /// Ties go to the earliest month.
    pub fn most_active_month(entries: &[WatchHistoryEntry]) -> Option<MonthRecord> {
        let mut months: BTreeMap<u32, (f64, u32)> = BTreeMap::new();
        for entry in entries {
            let month = months.entry(entry.time_watched.month()).or_insert((0.0, 0));
            month.0 += parse_duration_hours(&entry.duration);
            month.1 += 1;
        }
        if months.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let mean = months.values().map(|(hours, _)| hours).sum::<f64>() / months.len() as f64;

        let mut best: Option<(u32, f64, u32)> = None;
        for (&month, &(hours, count)) in &months {
            if best.map_or(true, |(_, best_hours, _)| hours > best_hours) {
                best = Some((month, hours, count));
            }
        }

        best.map(|(month, hours, count)| MonthRecord {
            month,
            name: month_name(month).to_string(),
            watch_time_hours: hours,
            video_count: count,
            percent_above_average: if mean > 0.0 {
                (hours - mean) / mean * 100.0
            } else {
                0.0
            },
        })
    }

    /// First point at which the running sum reaches the threshold.
    pub fn hours_milestone(&self, entries: &[WatchHistoryEntry]) -> Option<HoursMilestone> {
        let mut running = 0.0;
        for entry in sorted_by_time(entries) {
            running += parse_duration_hours(&entry.duration);
            if running >= self.threshold_hours {
                return Some(HoursMilestone {
                    threshold_hours: self.threshold_hours,
                    reached_at: entry.time_watched,
                    video_title: entry.title.clone(),
                    video_id: entry.video_id.clone(),
                });
            }
        }
        None
    }
}

impl Default for MilestoneDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator for MilestoneDetector {
    type Output = Milestones;

    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    fn aggregate(&self, entries: &[WatchHistoryEntry]) -> Milestones {
        let milestones = Milestones {
            longest_day: Self::longest_day(entries),
            most_active_month: Self::most_active_month(entries),
            longest_session: self.sessions.longest(entries),
            hours_milestone: self.hours_milestone(entries),
        };
        debug!(
            reached = milestones.hours_milestone.is_some(),
            "Detected milestones"
        );
        milestones
    }

    fn name(&self) -> &'static str {
        "milestones"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wrapped_common::test_utils::{
        assert_approx_eq, entry_fixtures::EntryBuilder, mock_timestamp,
    };

    fn at(time: DateTime<Utc>, duration: &str) -> WatchHistoryEntry {
        EntryBuilder::at(time).duration(duration).build()
    }

    fn uniform(count: u32, gap_minutes: i64, duration: &str) -> Vec<WatchHistoryEntry> {
        let start = mock_timestamp(2024, 2, 1, 8, 0, 0);
        (0..count)
            .map(|i| at(start + Duration::minutes(gap_minutes * i64::from(i)), duration))
            .collect()
    }

    #[test]
    fn test_uniform_gaps_form_one_session() {
        let entries = uniform(6, 10, "PT5M");
        let sessions = SessionDetector::new().sessions(&entries);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].video_count, 6);
        assert_approx_eq(sessions[0].watch_time_hours, 0.5, 1e-12);
    }

    #[test]
    fn test_gap_of_31_minutes_splits() {
        let mut entries = uniform(3, 10, "PT5M");
        let last = entries[2].time_watched;
        entries.push(at(last + Duration::minutes(31), "PT5M"));
        entries.push(at(last + Duration::minutes(41), "PT5M"));

        let sessions = SessionDetector::new().sessions(&entries);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].video_count, 3);
        assert_eq!(sessions[1].video_count, 2);
        let total: f64 = sessions.iter().map(|s| s.watch_time_hours).sum();
        assert_approx_eq(total, 25.0 / 60.0, 1e-12);
    }

    #[test]
    fn test_gap_of_exactly_30_minutes_joins() {
        let entries = uniform(2, 30, "PT1M");
        assert_eq!(SessionDetector::new().sessions(&entries).len(), 1);
    }

    #[test]
    fn test_unsorted_input_and_final_session_kept() {
        let base = mock_timestamp(2024, 2, 1, 8, 0, 0);
        let entries = vec![
            at(base + Duration::hours(5), "PT3H"),
            at(base, "PT1H"),
            at(base + Duration::minutes(20), "PT1H"),
        ];
        let longest = SessionDetector::new().longest(&entries).unwrap();
        assert_eq!(longest.start, base + Duration::hours(5));
        assert_approx_eq(longest.watch_time_hours, 3.0, 1e-12);
    }

    #[test]
    fn test_longest_session_keeps_first_on_tie() {
        let base = mock_timestamp(2024, 2, 1, 8, 0, 0);
        let entries = vec![at(base, "PT1H"), at(base + Duration::hours(3), "PT1H")];
        let longest = SessionDetector::new().longest(&entries).unwrap();
        assert_eq!(longest.start, base);
    }

    #[test]
    fn test_empty_input() {
        assert!(SessionDetector::new().sessions(&[]).is_empty());
        assert_eq!(MilestoneDetector::new().aggregate(&[]), Milestones::default());
    }

    #[test]
    fn test_longest_day() {
        let entries = vec![
            at(mock_timestamp(2024, 7, 15, 10, 0, 0), "PT1H"),
            at(mock_timestamp(2024, 7, 15, 10, 5, 0), "PT1H"),
        ];
        let day = MilestoneDetector::longest_day(&entries).unwrap();
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 7, 15).unwrap());
        assert_approx_eq(day.watch_time_hours, 2.0, 1e-12);
        assert_eq!(day.video_count, 2);
    }

    #[test]
    fn test_longest_day_tie_keeps_earliest() {
        let entries = vec![
            at(mock_timestamp(2024, 9, 2, 10, 0, 0), "PT1H"),
            at(mock_timestamp(2024, 9, 1, 10, 0, 0), "PT1H"),
        ];
        let day = MilestoneDetector::longest_day(&entries).unwrap();
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
    }

    #[test]
    fn test_most_active_month_uses_mean_of_active_months() {
        let entries = vec![
            at(mock_timestamp(2024, 1, 10, 10, 0, 0), "PT1H"),
            at(mock_timestamp(2024, 3, 10, 10, 0, 0), "PT2H"),
            at(mock_timestamp(2024, 5, 10, 10, 0, 0), "PT6H"),
        ];
        let month = MilestoneDetector::most_active_month(&entries).unwrap();
        assert_eq!(month.month, 5);
        assert_eq!(month.name, "May");
        // mean over three active months is 3h, not 9/12h
        assert_approx_eq(month.percent_above_average, 100.0, 1e-9);
    }

    #[test]
    fn test_hours_milestone() {
        let detector = MilestoneDetector::with_settings(30, 2.0);
        let entries = vec![
            EntryBuilder::at(mock_timestamp(2024, 1, 2, 0, 0, 0))
                .title("second")
                .duration("PT1H")
                .build(),
            EntryBuilder::at(mock_timestamp(2024, 1, 1, 0, 0, 0))
                .title("first")
                .duration("PT1H")
                .build(),
            EntryBuilder::at(mock_timestamp(2024, 1, 3, 0, 0, 0))
                .title("third")
                .duration("PT1H")
                .build(),
        ];
        let milestone = detector.hours_milestone(&entries).unwrap();
        assert_eq!(milestone.video_title, "second");
        assert_eq!(milestone.reached_at, mock_timestamp(2024, 1, 2, 0, 0, 0));

        let unreached = MilestoneDetector::new().hours_milestone(&entries);
        assert!(unreached.is_none());
    }

    proptest! {
        #[test]
        fn test_property_split_preserves_total(count in 2u32..30, split_at in 1u32..29, minutes in 1u32..59) {
            prop_assume!(split_at < count);
            let duration = format!("PT{minutes}M");
            let mut entries = uniform(count, 10, &duration);
            for entry in entries.iter_mut().skip(split_at as usize) {
                entry.time_watched += Duration::minutes(21);
            }

            let sessions = SessionDetector::new().sessions(&entries);
            prop_assert_eq!(sessions.len(), 2);
            let total: f64 = sessions.iter().map(|s| s.watch_time_hours).sum();
            let expected = f64::from(count) * f64::from(minutes) / 60.0;
            prop_assert!((total - expected).abs() < 1e-9);
        }
    }
}
