//! Placeholder data shown when a year cannot be computed.

use crate::yearly::{YearlyAggregate, YearlyAggregator};
use chrono::{DateTime, Duration, TimeZone, Utc};
use wrapped_common::{VideoId, WatchHistoryEntry};

const SAMPLE_CHANNELS: [(&str, &str, u32); 6] = [
    ("Pixel Plays", "UCsamplegaming", 20),
    ("Night Beats", "UCsamplemusic", 10),
    ("Lab Notes", "UCsamplescience", 28),
    ("Daily Laughs", "UCsamplecomedy", 23),
    ("Chalkboard", "UCsampleeducation", 27),
    ("Street Eats", "UCsampletravel", 19),
];

const SAMPLE_DURATIONS: [&str; 5] = ["PT12M30S", "PT24M", "PT8M15S", "PT41M", "PT1H3M"];

const SAMPLE_TAGS: [&str; 8] = [
    "gameplay", "lofi", "science", "sketch", "tutorial", "street food", "speedrun", "chill",
];

fn sample_entries(year: i32) -> Vec<WatchHistoryEntry> {
    let Some(start) = Utc.with_ymd_and_hms(year, 1, 3, 19, 0, 0).single() else {
        return Vec::new();
    };

    (0..96usize)
        .map(|i| {
            let (channel, channel_id, category) =
                SAMPLE_CHANNELS[(i * 7 + i / 5) % SAMPLE_CHANNELS.len()];
            let day_offset = i64::try_from(i * 3 + i % 4).unwrap_or_default();
            let minute_offset = i64::try_from((i % 3) * 25).unwrap_or_default();
            let mut entry = WatchHistoryEntry::new(
                format!("{channel} episode {}", i % 12 + 1),
                start + Duration::days(day_offset) + Duration::minutes(minute_offset),
            );
            entry.video_id = Some(VideoId(format!("sample{:05}", i % 40)));
            entry.channel_name = Some(channel.to_string());
            entry.channel_url = Some(format!("https://www.youtube.com/channel/{channel_id}"));
            entry.category_id = Some(category);
            entry.duration = SAMPLE_DURATIONS[i % SAMPLE_DURATIONS.len()].to_string();
            entry.tags = Some(vec![
                SAMPLE_TAGS[i % SAMPLE_TAGS.len()].to_string(),
                SAMPLE_TAGS[(i / 2) % SAMPLE_TAGS.len()].to_string(),
            ]);
            entry
        })
        .filter(|entry| entry.year() == year)
        .collect()
}

/// Deterministic sample aggregate for `year`, compared against `compare`
/// when given.
///
/// Computed by the regular pipeline over synthetic entries, with the
/// generation time pinned to the start of the following year. Years outside
/// the calendar range produce an empty aggregate.
pub fn placeholder_aggregate(year: i32, compare: Option<i32>) -> YearlyAggregate {
    let entries = sample_entries(year);
    let previous = compare.map(|previous_year| (previous_year, sample_entries(previous_year)));
    let mut aggregate = YearlyAggregator::default().aggregate(
        year,
        &entries,
        previous
            .as_ref()
            .map(|(previous_year, previous_entries)| (*previous_year, previous_entries.as_slice())),
    );

    let pinned = year
        .checked_add(1)
        .and_then(|next| Utc.with_ymd_and_hms(next, 1, 1, 0, 0, 0).single())
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    aggregate.generated_at = pinned;
    aggregate
}
