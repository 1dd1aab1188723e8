//! Creator rankings and per-creator category affinity.

use crate::categories::category_name;
use crate::duration::parse_duration_hours;
use crate::traits::Aggregator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};
use wrapped_common::{channel_id_from_url, ChannelId, WatchHistoryEntry};
use wrapped_config::DEFAULT_TOP_N;

/// A creator's total watch time in a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorStat {
    /// Channel name as it appears in the history.
    pub name: String,
    /// Empty when no entry carried a usable channel URL.
    pub channel_id: ChannelId,
    /// Summed watch time.
    pub watch_time_hours: f64,
    /// Entries from this creator.
    pub video_count: u32,
}

/// Share of one category within a creator's watch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    /// `None` for the unknown bucket.
    pub category_id: Option<u32>,
    /// Display name.
    pub name: String,
    /// Creator's watch time in this category.
    pub watch_time_hours: f64,
    /// Share of the creator's watch time, 0-100.
    pub percentage: f64,
}

/// Which categories a creator's videos fall into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorAffinity {
    /// Channel name.
    pub name: String,
    /// Channel id, empty when unknown.
    pub channel_id: ChannelId,
    /// Creator's total watch time.
    pub watch_time_hours: f64,
    /// Category shares, largest first.
    pub categories: Vec<CategoryShare>,
    /// Name of the largest share.
    pub dominant_category: Option<String>,
}

#[derive(Default)]
struct CreatorAccumulator {
    channel_id: ChannelId,
    hours: f64,
    count: u32,
    categories: HashMap<Option<u32>, f64>,
}

/// Aggregator for top creators
#[derive(Debug, Clone)]
pub struct CreatorAggregator {
    limit: usize,
}

impl CreatorAggregator {
    /// Create an aggregator keeping the default number of creators
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_TOP_N)
    }

    /// Keep at most `limit` creators
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    fn accumulate(entries: &[WatchHistoryEntry]) -> HashMap<String, CreatorAccumulator> {
        let mut creators: HashMap<String, CreatorAccumulator> = HashMap::new();
        for entry in entries {
            let Some(name) = entry.channel_name.as_deref().filter(|n| !n.trim().is_empty()) else {
                continue;
            };
            let hours = parse_duration_hours(&entry.duration);
            let creator = creators.entry(name.to_string()).or_default();
            creator.hours += hours;
            creator.count += 1;
            *creator.categories.entry(entry.category_id).or_insert(0.0) += hours;
            if creator.channel_id.is_empty() {
                creator.channel_id = channel_id_from_url(entry.channel_url.as_deref());
            }
        }
        creators
    }

    fn ranked(entries: &[WatchHistoryEntry]) -> Vec<(String, CreatorAccumulator)> {
        let mut ranked: Vec<(String, CreatorAccumulator)> =
            Self::accumulate(entries).into_iter().collect();
        ranked.sort_by(|(name_a, a), (name_b, b)| {
            b.hours.total_cmp(&a.hours).then_with(|| name_a.cmp(name_b))
        });
        ranked
    }

    /// Number of distinct channel names in `entries`.
    pub fn unique_creators(entries: &[WatchHistoryEntry]) -> usize {
        Self::accumulate(entries).len()
    }

    /// Category breakdown for each of the top creators.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub fn affinity(&self, entries: &[WatchHistoryEntry]) -> Vec<CreatorAffinity> {
        Self::ranked(entries)
            .into_iter()
            .take(self.limit)
            .map(|(name, creator)| {
                let mut categories: Vec<CategoryShare> = creator
                    .categories
                    .into_iter()
                    .map(|(category_id, hours)| CategoryShare {
                        category_id,
                        name: category_name(category_id),
                        watch_time_hours: hours,
                        percentage: if creator.hours > 0.0 {
                            hours / creator.hours * 100.0
                        } else {
                            0.0
                        },
                    })
                    .collect();
                categories.sort_by(|a, b| {
                    b.watch_time_hours
                        .total_cmp(&a.watch_time_hours)
                        .then_with(|| a.category_id.cmp(&b.category_id))
                });
                let dominant_category = categories
                    .first()
                    .filter(|share| share.watch_time_hours > 0.0)
                    .map(|share| share.name.clone());
                CreatorAffinity {
                    name,
                    channel_id: creator.channel_id,
                    watch_time_hours: creator.hours,
                    categories,
                    dominant_category,
                }
            })
            .collect()
    }
}

impl Default for CreatorAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator for CreatorAggregator {
    type Output = Vec<CreatorStat>;

    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    fn aggregate(&self, entries: &[WatchHistoryEntry]) -> Vec<CreatorStat> {
        let result: Vec<CreatorStat> = Self::ranked(entries)
            .into_iter()
            .take(self.limit)
            .map(|(name, creator)| CreatorStat {
                name,
                channel_id: creator.channel_id,
                watch_time_hours: creator.hours,
                video_count: creator.count,
            })
            .collect();
        debug!("Aggregated {} top creators", result.len());
        result
    }

    fn name(&self) -> &'static str {
        "creators"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrapped_common::test_utils::{
        assert_approx_eq,
        entry_fixtures::{sample_year_entries, EntryBuilder},
        mock_timestamp,
    };

    fn watched(
        channel: &str,
        channel_id: &str,
        duration: &str,
        category: u32,
    ) -> WatchHistoryEntry {
        EntryBuilder::at(mock_timestamp(2024, 5, 1, 9, 0, 0))
            .channel(channel, channel_id)
            .duration(duration)
            .category(category)
            .build()
    }

    #[test]
    fn test_top_creators_sorted_by_watch_time() {
        let creators = CreatorAggregator::new().aggregate(&sample_year_entries(2023));
        assert_eq!(creators.len(), 2);
        assert_eq!(creators[0].name, "GameChannel");
        assert_approx_eq(creators[0].watch_time_hours, 1.5, 1e-12);
        assert_eq!(creators[0].video_count, 2);
        assert_eq!(creators[0].channel_id.as_str(), "UCgame");
        assert_eq!(creators[1].name, "LearnDaily");
        assert_approx_eq(creators[1].watch_time_hours, 1.0, 1e-12);
    }

    #[test]
    fn test_same_name_merges_and_missing_name_skipped() {
        let mut entries = vec![
            watched("Twin", "UCone", "PT1H", 20),
            watched("Twin", "UCtwo", "PT1H", 20),
        ];
        entries.push(
            EntryBuilder::at(mock_timestamp(2024, 5, 2, 9, 0, 0))
                .duration("PT9H")
                .build(),
        );

        let creators = CreatorAggregator::new().aggregate(&entries);
        assert_eq!(creators.len(), 1);
        assert_eq!(creators[0].video_count, 2);
        assert_eq!(creators[0].channel_id.as_str(), "UCone");
        assert_eq!(CreatorAggregator::unique_creators(&entries), 1);
    }

    #[test]
    fn test_ties_break_by_name_and_truncate() {
        let entries: Vec<_> = ["Echo", "Delta", "Charlie", "Bravo", "Alpha", "Foxtrot"]
            .iter()
            .map(|name| watched(name, "UCx", "PT1H", 20))
            .collect();
        let creators = CreatorAggregator::new().aggregate(&entries);
        let names: Vec<_> = creators.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Bravo", "Charlie", "Delta", "Echo"]);
    }

    #[test]
    fn test_missing_channel_url_gives_empty_id() {
        let mut entry = watched("NoUrl", "UCx", "PT1H", 20);
        entry.channel_url = None;
        let creators = CreatorAggregator::new().aggregate(&[entry]);
        assert!(creators[0].channel_id.is_empty());
    }

    #[test]
    fn test_affinity_breakdown() {
        let entries = vec![
            watched("Mixed", "UCmix", "PT3H", 20),
            watched("Mixed", "UCmix", "PT1H", 10),
        ];
        let affinity = CreatorAggregator::new().affinity(&entries);

        assert_eq!(affinity.len(), 1);
        let mixed = &affinity[0];
        assert_eq!(mixed.dominant_category.as_deref(), Some("Gaming"));
        assert_eq!(mixed.categories.len(), 2);
        assert_approx_eq(mixed.categories[0].percentage, 75.0, 1e-9);
        assert_approx_eq(mixed.categories[1].percentage, 25.0, 1e-9);
    }

    #[test]
    fn test_affinity_without_watch_time_has_no_dominant_category() {
        let entries = vec![watched("Silent", "UCs", "", 20)];
        let affinity = CreatorAggregator::new().affinity(&entries);
        assert_eq!(affinity[0].dominant_category, None);
        assert_eq!(affinity[0].categories[0].percentage, 0.0);
    }
}
