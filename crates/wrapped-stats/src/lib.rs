//! # Wrapped Stats
//!
//! The watch-history aggregation pipeline for YouTube Wrapped.
//!
//! Each statistic is computed by its own [`Aggregator`] in a single pass over
//! one year's entries: duration parsing, category shares and comparisons,
//! creator rankings and affinity, sessions and milestones, viewing patterns,
//! and tag frequencies. [`YearlyAggregator`] composes them into a
//! [`YearlyAggregate`], which [`AggregateCache`] holds for a bounded time.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod categories;
pub mod creators;
pub mod duration;
pub mod patterns;
pub mod sample;
pub mod sessions;
pub mod tags;
pub mod traits;
pub mod yearly;

pub use cache::{AggregateCache, AggregateKey, CacheMetrics};
pub use categories::{
    category_name, CategoryAggregator, CategoryComparison, CategoryStat, RewatchedVideo,
};
pub use creators::{CategoryShare, CreatorAffinity, CreatorAggregator, CreatorStat};
pub use duration::parse_duration_hours;
pub use patterns::{HourBucket, MonthBucket, PatternAggregator, ViewingPatterns, WeekdayBucket};
pub use sample::placeholder_aggregate;
pub use sessions::{
    DayRecord, HoursMilestone, MilestoneDetector, Milestones, MonthRecord, Session,
    SessionDetector,
};
pub use tags::{TagExtractor, TagFrequency, TagSummary};
pub use traits::Aggregator;
pub use yearly::{YearComparison, YearlyAggregate, YearlyAggregator};
