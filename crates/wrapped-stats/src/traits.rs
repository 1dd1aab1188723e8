//! Aggregator trait definitions.

use wrapped_common::WatchHistoryEntry;

/// A single pass over one year's entries producing one statistic.
///
/// Aggregators are pure: malformed per-entry fields are recovered locally,
/// so aggregation itself never fails.
pub trait Aggregator: Send + Sync {
    /// The statistic produced.
    type Output;

    /// Computes the statistic.
    fn aggregate(&self, entries: &[WatchHistoryEntry]) -> Self::Output;

    /// Gets the name of this aggregator, used in log spans.
    fn name(&self) -> &'static str;
}

/// Sorts entries by watch time, oldest first.
pub(crate) fn sorted_by_time(entries: &[WatchHistoryEntry]) -> Vec<&WatchHistoryEntry> {
    let mut sorted: Vec<&WatchHistoryEntry> = entries.iter().collect();
    sorted.sort_by_key(|entry| entry.time_watched);
    sorted
}
