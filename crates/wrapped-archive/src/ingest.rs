//! Google Takeout `watch-history.json` ingestion.

use crate::store::ArchiveStore;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};
use wrapped_common::{extract_video_id, Result, UserId, WatchHistoryEntry, WrappedError};

const WATCHED_PREFIX: &str = "Watched ";

#[derive(Debug, Deserialize)]
struct TakeoutRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "titleUrl")]
    title_url: Option<String>,
    #[serde(default)]
    subtitles: Vec<TakeoutSubtitle>,
    #[serde(default)]
    time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TakeoutSubtitle {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl TakeoutRecord {
    fn into_entry(self) -> Option<WatchHistoryEntry> {
        let time_watched = self
            .time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))?;

        let title = self
            .title
            .map(|t| t.strip_prefix(WATCHED_PREFIX).map(str::to_string).unwrap_or(t));
        if title.is_none() && self.title_url.is_none() {
            return None;
        }

        let mut entry = WatchHistoryEntry::new(
            title.or_else(|| self.title_url.clone()).unwrap_or_default(),
            time_watched,
        );
        entry.video_id = self.title_url.as_deref().and_then(extract_video_id);
        if let Some(channel) = self.subtitles.into_iter().next() {
            entry.channel_name = channel.name;
            entry.channel_url = channel.url;
        }
        Some(entry)
    }
}

/// Parses a Takeout watch-history document.
///
/// Records without a parseable `time`, and records with neither a title nor
/// a title URL, are dropped. Only a document that is not a JSON array fails.
#[instrument(skip(json), fields(bytes = json.len()))]
pub fn parse_takeout(json: &str) -> Result<Vec<WatchHistoryEntry>> {
    let records: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let total = records.len();

    let entries: Vec<WatchHistoryEntry> = records
        .into_iter()
        .filter_map(|value| serde_json::from_value::<TakeoutRecord>(value).ok())
        .filter_map(TakeoutRecord::into_entry)
        .collect();

    if entries.len() < total {
        warn!("Dropped {} of {} Takeout records", total - entries.len(), total);
    }
    debug!("Parsed {} watch-history entries", entries.len());
    Ok(entries)
}

/// Partitions entries by UTC calendar year.
pub fn group_by_year(entries: Vec<WatchHistoryEntry>) -> BTreeMap<i32, Vec<WatchHistoryEntry>> {
    let mut years: BTreeMap<i32, Vec<WatchHistoryEntry>> = BTreeMap::new();
    for entry in entries {
        years.entry(entry.year()).or_default().push(entry);
    }
    years
}

/// Result of an import: entry counts per year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Entries persisted in the backup.
    pub total: usize,
    /// Entries persisted per year.
    pub years: BTreeMap<i32, usize>,
}

/// Persists a parsed archive: the backup key, every year key, and the
/// available-years list.
#[instrument(skip(store, entries), fields(user = %user, entries = entries.len()))]
pub async fn import_archive(
    store: &dyn ArchiveStore,
    user: &UserId,
    entries: Vec<WatchHistoryEntry>,
) -> Result<ImportSummary> {
    if entries.is_empty() {
        return Err(WrappedError::validation_field(
            "archive contains no watch-history entries",
            "archive",
        ));
    }

    store.save_backup(user, &entries).await?;
    let total = entries.len();
    let grouped = group_by_year(entries);

    let mut summary = ImportSummary {
        total,
        years: BTreeMap::new(),
    };
    for (year, year_entries) in &grouped {
        store.save_year(user, *year, year_entries).await?;
        summary.years.insert(*year, year_entries.len());
    }

    let years: Vec<i32> = grouped.keys().copied().collect();
    store.save_available_years(user, &years).await?;

    info!("Imported {} entries across {} years", total, years.len());
    Ok(summary)
}
