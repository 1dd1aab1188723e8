//! Category distribution and year-over-year category comparison.

use crate::duration::parse_duration_hours;
use crate::traits::Aggregator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};
use wrapped_common::{VideoId, WatchHistoryEntry};
use wrapped_config::{DEFAULT_TOP_N, DEFAULT_TOP_VIDEOS_PER_CATEGORY};

/// Display name of the bucket holding entries without a category.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Resolves a YouTube category id to its display name.
pub fn category_name(id: Option<u32>) -> String {
    let Some(id) = id else {
        return UNKNOWN_CATEGORY.to_string();
    };
    let name = match id {
        1 => "Film & Animation",
        2 => "Autos & Vehicles",
        10 => "Music",
        15 => "Pets & Animals",
        17 => "Sports",
        18 => "Short Movies",
        19 => "Travel & Events",
        20 => "Gaming",
        21 => "Videoblogging",
        22 => "People & Blogs",
        23 | 34 => "Comedy",
        24 => "Entertainment",
        25 => "News & Politics",
        26 => "Howto & Style",
        27 => "Education",
        28 => "Science & Technology",
        29 => "Nonprofits & Activism",
        30 => "Movies",
        31 => "Anime/Animation",
        32 => "Action/Adventure",
        33 => "Classics",
        35 => "Documentary",
        36 => "Drama",
        37 => "Family",
        38 => "Foreign",
        39 => "Horror",
        40 => "Sci-Fi/Fantasy",
        41 => "Thriller",
        42 => "Shorts",
        43 => "Shows",
        44 => "Trailers",
        other => return format!("Category {other}"),
    };
    name.to_string()
}

/// A video watched more than once within a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewatchedVideo {
    /// `None` when the entry URL carried no recognizable id.
    pub video_id: Option<VideoId>,
    /// Title as first seen.
    pub title: String,
    /// Times the video was watched in the year.
    pub watch_count: u32,
}

/// One category's share of a year's watch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    /// `None` for the unknown bucket.
    pub category_id: Option<u32>,
    /// Display name, "Unknown" for the unknown bucket.
    pub name: String,
    /// Summed watch time.
    pub watch_time_hours: f64,
    /// Entries in the category.
    pub video_count: u32,
    /// Share of the year's total watch time, 0-100.
    pub percentage: f64,
    /// Most rewatched videos, only those watched more than once.
    pub top_videos: Vec<RewatchedVideo>,
}

/// Change of one category's share between two years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryComparison {
    /// `None` for the unknown bucket.
    pub category_id: Option<u32>,
    /// Display name.
    pub name: String,
    /// Watch time in the requested year.
    pub current_watch_time_hours: f64,
    /// Watch time in the earlier year, 0 when absent from its top list.
    pub previous_watch_time_hours: f64,
    /// Share in the requested year.
    pub current_percentage: f64,
    /// Share in the earlier year.
    pub previous_percentage: f64,
    /// Signed percentage-point change, current minus previous.
    pub change: f64,
}

#[derive(Default)]
struct CategoryAccumulator {
    hours: f64,
    count: u32,
    first_seen: usize,
    videos: HashMap<String, VideoAccumulator>,
}

struct VideoAccumulator {
    video_id: Option<VideoId>,
    title: String,
    count: u32,
    first_seen: usize,
}

/// Aggregator for per-category watch time
#[derive(Debug, Clone)]
pub struct CategoryAggregator {
    limit: usize,
    top_videos: usize,
}

impl CategoryAggregator {
    /// Create an aggregator with the default limits
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_TOP_N, DEFAULT_TOP_VIDEOS_PER_CATEGORY)
    }

    /// Keep `limit` categories and `top_videos` rewatched videos per category
    pub fn with_limits(limit: usize, top_videos: usize) -> Self {
        Self { limit, top_videos }
    }

    /// Full distribution over every category, sorted by watch time.
    ///
    /// Percentages sum to 100 when the year has any watch time.
    pub fn distribution(&self, entries: &[WatchHistoryEntry]) -> Vec<CategoryStat> {
        let mut buckets: HashMap<Option<u32>, CategoryAccumulator> = HashMap::new();
        let mut total_hours = 0.0;

        for (index, entry) in entries.iter().enumerate() {
            let hours = parse_duration_hours(&entry.duration);
            total_hours += hours;

            let bucket = buckets.entry(entry.category_id).or_insert_with(|| CategoryAccumulator {
                first_seen: index,
                ..CategoryAccumulator::default()
            });
            bucket.hours += hours;
            bucket.count += 1;

            let video_key = entry
                .video_id
                .as_ref()
                .map_or_else(|| entry.title.clone(), |id| id.as_str().to_string());
            bucket
                .videos
                .entry(video_key)
                .or_insert_with(|| VideoAccumulator {
                    video_id: entry.video_id.clone(),
                    title: entry.title.clone(),
                    count: 0,
                    first_seen: index,
                })
                .count += 1;
        }

        let mut ordered: Vec<(Option<u32>, CategoryAccumulator)> = buckets.into_iter().collect();
        ordered.sort_by(|(_, a), (_, b)| {
            b.hours
                .total_cmp(&a.hours)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        });

        ordered
            .into_iter()
            .map(|(category_id, bucket)| {
                let percentage = if total_hours > 0.0 {
                    bucket.hours / total_hours * 100.0
                } else {
                    0.0
                };
                CategoryStat {
                    category_id,
                    name: category_name(category_id),
                    watch_time_hours: bucket.hours,
                    video_count: bucket.count,
                    percentage,
                    top_videos: self.top_videos(bucket.videos),
                }
            })
            .collect()
    }

    fn top_videos(&self, videos: HashMap<String, VideoAccumulator>) -> Vec<RewatchedVideo> {
        let mut videos: Vec<VideoAccumulator> = videos.into_values().collect();
        videos.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.first_seen.cmp(&b.first_seen)));
        videos
            .into_iter()
            .take(self.top_videos)
            .map(|v| RewatchedVideo {
                video_id: v.video_id,
                title: v.title,
                watch_count: v.count,
            })
            .collect()
    }

    /// Compares two years' top-N distributions.
    ///
    /// Categories from either list are reported; a category missing from one
    /// side counts as zero there. An empty `previous` therefore yields
    /// `change == current_percentage` for every record.
    #[instrument(skip(self, current, previous))]
    pub fn compare(
        &self,
        current: &[CategoryStat],
        previous: &[CategoryStat],
    ) -> Vec<CategoryComparison> {
        let find = |list: &[CategoryStat], id: Option<u32>| {
            list.iter()
                .find(|stat| stat.category_id == id)
                .map_or((0.0, 0.0), |stat| (stat.watch_time_hours, stat.percentage))
        };

        let mut ids: Vec<Option<u32>> = Vec::new();
        for stat in current.iter().chain(previous) {
            if !ids.contains(&stat.category_id) {
                ids.push(stat.category_id);
            }
        }

        let mut comparisons: Vec<CategoryComparison> = ids
            .into_iter()
            .map(|id| {
                let (current_hours, current_pct) = find(current, id);
                let (previous_hours, previous_pct) = find(previous, id);
                CategoryComparison {
                    category_id: id,
                    name: category_name(id),
                    current_watch_time_hours: current_hours,
                    previous_watch_time_hours: previous_hours,
                    current_percentage: current_pct,
                    previous_percentage: previous_pct,
                    change: current_pct - previous_pct,
                }
            })
            .collect();

        comparisons.sort_by(|a, b| b.change.abs().total_cmp(&a.change.abs()));
        comparisons.truncate(self.limit);
        debug!("Compared {} categories", comparisons.len());
        comparisons
    }
}

impl Default for CategoryAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator for CategoryAggregator {
    type Output = Vec<CategoryStat>;

    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    fn aggregate(&self, entries: &[WatchHistoryEntry]) -> Vec<CategoryStat> {
        let mut stats = self.distribution(entries);
        stats.truncate(self.limit);
        debug!("Aggregated {} top categories", stats.len());
        stats
    }

    fn name(&self) -> &'static str {
        "categories"
    }
}
