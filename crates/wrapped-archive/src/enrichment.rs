//! Video metadata enrichment.
//!
//! Entries of recent years are completed with category, duration, tags and
//! statistics fetched from a [`MetadataSource`]. Fetched metadata is kept in a
//! [`MetadataCache`] so an id is requested from the remote API only once.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use wrapped_common::{Result, VideoId, WatchHistoryEntry, WrappedError};
use wrapped_config::MAX_BATCH_SIZE;

/// Number of recent years enriched by default.
pub const ENRICHED_YEAR_COUNT: usize = 2;

/// Metadata describing one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Video the metadata belongs to.
    pub video_id: VideoId,
    /// Channel title reported by the API.
    pub channel_name: Option<String>,
    /// Channel id reported by the API.
    pub channel_id: Option<String>,
    /// YouTube category id.
    pub category_id: Option<u32>,
    /// Upload time.
    pub published_at: Option<DateTime<Utc>>,
    /// Uploader-assigned tags.
    pub tags: Option<Vec<String>>,
    /// View count at fetch time.
    pub view_count: Option<u64>,
    /// Like count at fetch time.
    pub like_count: Option<u64>,
    /// Comment count at fetch time.
    pub comment_count: Option<u64>,
    /// Audience flag.
    pub made_for_kids: Option<bool>,
    /// ISO-8601 duration; empty when unknown.
    #[serde(default)]
    pub duration: String,
}

impl VideoMetadata {
    /// Copies metadata onto an entry.
    ///
    /// Channel fields from the archive take precedence; the others are
    /// overwritten.
    pub fn apply_to(&self, entry: &mut WatchHistoryEntry) {
        if entry.channel_name.is_none() {
            entry.channel_name.clone_from(&self.channel_name);
        }
        if entry.channel_url.is_none() {
            entry.channel_url = self
                .channel_id
                .as_ref()
                .map(|id| format!("https://www.youtube.com/channel/{id}"));
        }
        entry.category_id = self.category_id;
        entry.duration.clone_from(&self.duration);
        entry.tags.clone_from(&self.tags);
        entry.view_count = self.view_count;
        entry.like_count = self.like_count;
        entry.comment_count = self.comment_count;
        entry.made_for_kids = self.made_for_kids;
        entry.published_at = self.published_at;
    }
}

/// Remote provider of video metadata.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetches metadata for up to one batch of ids. Unknown ids are omitted.
    async fn fetch(&self, ids: &[VideoId]) -> Result<Vec<VideoMetadata>>;
}

/// Persistent metadata keyed by video id.
#[async_trait]
pub trait MetadataCache: Send + Sync {
    /// Returns the cached subset of `ids`.
    async fn get_many(&self, ids: &[VideoId]) -> Result<HashMap<VideoId, VideoMetadata>>;

    /// Stores fetched metadata.
    async fn put_many(&self, items: &[VideoMetadata]) -> Result<()>;
}

/// Gzip-compressed JSON files, one per video id.
#[derive(Debug, Clone)]
pub struct FileMetadataCache {
    dir: PathBuf,
}

impl FileMetadataCache {
    /// Create a cache storing files under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &VideoId) -> PathBuf {
        self.dir.join(format!("{id}.json.gz"))
    }

    fn decode(bytes: &[u8]) -> std::io::Result<VideoMetadata> {
        let mut decoder = GzDecoder::new(bytes);
        let mut json = Vec::new();
        decoder.read_to_end(&mut json)?;
        Ok(serde_json::from_slice(&json)?)
    }

    fn encode(item: &VideoMetadata) -> std::io::Result<Vec<u8>> {
        let json = serde_json::to_vec(item)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        encoder.finish()
    }
}

#[async_trait]
impl MetadataCache for FileMetadataCache {
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    async fn get_many(&self, ids: &[VideoId]) -> Result<HashMap<VideoId, VideoMetadata>> {
        let mut found = HashMap::new();
        for id in ids {
            let path = self.path_for(id);
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(WrappedError::storage_with_source(
                        format!("Failed to read {}", path.display()),
                        e,
                    ))
                }
            };
            match Self::decode(&bytes) {
                Ok(item) => {
                    found.insert(id.clone(), item);
                }
                Err(e) => warn!(
                    "Ignoring unreadable metadata cache file {}: {}",
                    path.display(),
                    e
                ),
            }
        }
        debug!("Metadata cache returned {} of {} ids", found.len(), ids.len());
        Ok(found)
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn put_many(&self, items: &[VideoMetadata]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            WrappedError::storage_with_source(format!("Failed to create {}", self.dir.display()), e)
        })?;
        for item in items {
            let encoded = Self::encode(item)
                .map_err(|e| WrappedError::storage_with_source("Failed to compress metadata", e))?;
            let path = self.path_for(&item.video_id);
            let temp = path.with_extension("tmp");
            tokio::fs::write(&temp, encoded).await.map_err(|e| {
                WrappedError::storage_with_source(format!("Failed to write {}", temp.display()), e)
            })?;
            tokio::fs::rename(&temp, &path).await.map_err(|e| {
                WrappedError::storage_with_source(
                    format!("Failed to replace {}", path.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

/// Process-local metadata cache.
#[derive(Debug, Default)]
pub struct MemoryMetadataCache {
    items: RwLock<HashMap<VideoId, VideoMetadata>>,
}

impl MemoryMetadataCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached videos.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether nothing is cached yet.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl MetadataCache for MemoryMetadataCache {
    async fn get_many(&self, ids: &[VideoId]) -> Result<HashMap<VideoId, VideoMetadata>> {
        let items = self.items.read();
        Ok(ids
            .iter()
            .filter_map(|id| items.get(id).map(|item| (id.clone(), item.clone())))
            .collect())
    }

    async fn put_many(&self, items: &[VideoMetadata]) -> Result<()> {
        let mut stored = self.items.write();
        for item in items {
            stored.insert(item.video_id.clone(), item.clone());
        }
        Ok(())
    }
}

/// Outcome of one enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    /// Distinct ids that needed metadata.
    pub requested: usize,
    /// Ids served from the metadata cache.
    pub cache_hits: usize,
    /// Ids returned by the remote source.
    pub fetched: usize,
    /// Batches whose request failed.
    pub failed_batches: usize,
    /// Entries that received metadata.
    pub enriched_entries: usize,
}

/// Batches metadata lookups for a set of entries.
pub struct Enricher {
    source: Arc<dyn MetadataSource>,
    cache: Arc<dyn MetadataCache>,
    batch_size: usize,
}

impl Enricher {
    /// Create an enricher using the largest allowed batch size
    pub fn new(source: Arc<dyn MetadataSource>, cache: Arc<dyn MetadataCache>) -> Self {
        Self::with_batch_size(source, cache, MAX_BATCH_SIZE)
    }

    /// Batch size is clamped to `1..=50`.
    pub fn with_batch_size(
        source: Arc<dyn MetadataSource>,
        cache: Arc<dyn MetadataCache>,
        batch_size: usize,
    ) -> Self {
        Self {
            source,
            cache,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    /// Enriches every entry that has a video id and no metadata yet.
    ///
    /// A failed batch leaves its entries untouched and the run continues.
    /// Cache failures are logged and do not fail the run.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub async fn enrich(&self, entries: &mut [WatchHistoryEntry]) -> Result<EnrichmentReport> {
        let mut seen = HashSet::new();
        let wanted: Vec<VideoId> = entries
            .iter()
            .filter(|e| !e.is_enriched())
            .filter_map(|e| e.video_id.clone())
            .filter(|id| seen.insert(id.clone()))
            .collect();

        let mut report = EnrichmentReport {
            requested: wanted.len(),
            ..EnrichmentReport::default()
        };
        if wanted.is_empty() {
            debug!("Nothing to enrich");
            return Ok(report);
        }

        let mut metadata = match self.cache.get_many(&wanted).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Metadata cache lookup failed: {}", e);
                HashMap::new()
            }
        };
        report.cache_hits = metadata.len();

        let missing: Vec<VideoId> = wanted
            .into_iter()
            .filter(|id| !metadata.contains_key(id))
            .collect();

        for batch in missing.chunks(self.batch_size) {
            match self.source.fetch(batch).await {
                Ok(items) => {
                    report.fetched += items.len();
                    if let Err(e) = self.cache.put_many(&items).await {
                        warn!("Failed to cache fetched metadata: {}", e);
                    }
                    for item in items {
                        metadata.insert(item.video_id.clone(), item);
                    }
                }
                Err(e) => {
                    warn!("Metadata batch of {} ids failed: {}", batch.len(), e);
                    report.failed_batches += 1;
                }
            }
        }

        for entry in entries.iter_mut().filter(|e| !e.is_enriched()) {
            if let Some(item) = entry.video_id.as_ref().and_then(|id| metadata.get(id)) {
                item.apply_to(entry);
                report.enriched_entries += 1;
            }
        }

        info!(
            "Enriched {} entries ({} cached, {} fetched, {} failed batches)",
            report.enriched_entries, report.cache_hits, report.fetched, report.failed_batches
        );
        Ok(report)
    }
}

/// The most recent years strictly before `today`'s year, newest first.
pub fn enrichment_years(available: &[i32], today: NaiveDate) -> Vec<i32> {
    let mut years: Vec<i32> = available
        .iter()
        .copied()
        .filter(|year| *year < today.year())
        .collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years.truncate(ENRICHED_YEAR_COUNT);
    years
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wrapped_common::test_utils::{create_temp_dir, entry_fixtures::EntryBuilder, mock_timestamp};

    #[derive(Default)]
    struct FakeSource {
        calls: AtomicUsize,
        fail_call: Option<usize>,
    }

    #[async_trait]
    impl MetadataSource for FakeSource {
        async fn fetch(&self, ids: &[VideoId]) -> Result<Vec<VideoMetadata>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_call == Some(call) {
                return Err(WrappedError::network_with_status("quota exceeded", 403));
            }
            Ok(ids
                .iter()
                .filter(|id| id.as_str() != "unknown0000")
                .map(|id| metadata(id.as_str()))
                .collect())
        }
    }

    fn metadata(id: &str) -> VideoMetadata {
        VideoMetadata {
            video_id: VideoId::from(id),
            channel_name: Some("Fetched".to_string()),
            channel_id: Some("UCfetched".to_string()),
            category_id: Some(20),
            duration: "PT10M".to_string(),
            tags: Some(vec!["tag".to_string()]),
            ..VideoMetadata::default()
        }
    }

    fn entry(id: &str) -> WatchHistoryEntry {
        EntryBuilder::at(mock_timestamp(2023, 5, 1, 12, 0, 0))
            .video(id)
            .build()
    }

    #[test]
    fn test_default_metadata_clears_enrichment_fields() {
        let mut e = entry("aaaaaaaaaaa");
        e.category_id = Some(10);
        e.duration = "PT3M".to_string();
        VideoMetadata::default().apply_to(&mut e);

        assert_eq!(e.category_id, None);
        assert!(e.duration.is_empty());
        assert_eq!(e.tags, None);
        assert_eq!(VideoMetadata::default().video_id.as_str(), "");
    }

    #[test]
    fn test_apply_keeps_archive_channel() {
        let mut e = entry("aaaaaaaaaaa");
        e.channel_name = Some("Original".to_string());
        metadata("aaaaaaaaaaa").apply_to(&mut e);

        assert_eq!(e.channel_name.as_deref(), Some("Original"));
        assert_eq!(
            e.channel_url.as_deref(),
            Some("https://www.youtube.com/channel/UCfetched")
        );
        assert_eq!(e.category_id, Some(20));
        assert!(e.is_enriched());
    }

    #[tokio::test]
    async fn test_enrich_batches_and_caches() {
        let source = Arc::new(FakeSource::default());
        let cache = Arc::new(MemoryMetadataCache::new());
        let enricher = Enricher::with_batch_size(source.clone(), cache.clone(), 2);

        let mut entries = vec![
            entry("aaaaaaaaaaa"),
            entry("bbbbbbbbbbb"),
            entry("aaaaaaaaaaa"),
            entry("ccccccccccc"),
            entry("unknown0000"),
        ];
        let report = enricher.enrich(&mut entries).await.unwrap();

        assert_eq!(report.requested, 4);
        assert_eq!(report.fetched, 3);
        assert_eq!(report.enriched_entries, 4);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 3);
        assert!(!entries[4].is_enriched());

        let mut again = vec![entry("bbbbbbbbbbb")];
        let report = enricher.enrich(&mut again).await.unwrap();
        assert_eq!(report.cache_hits, 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_abort() {
        let source = Arc::new(FakeSource {
            fail_call: Some(0),
            ..FakeSource::default()
        });
        let enricher =
            Enricher::with_batch_size(source, Arc::new(MemoryMetadataCache::new()), 1);

        let mut entries = vec![entry("aaaaaaaaaaa"), entry("bbbbbbbbbbb")];
        let report = enricher.enrich(&mut entries).await.unwrap();

        assert_eq!(report.failed_batches, 1);
        assert!(!entries[0].is_enriched());
        assert!(entries[1].is_enriched());
    }

    #[tokio::test]
    async fn test_already_enriched_entries_are_skipped() {
        let source = Arc::new(FakeSource::default());
        let enricher = Enricher::new(source.clone(), Arc::new(MemoryMetadataCache::new()));

        let mut entries = vec![EntryBuilder::at(mock_timestamp(2023, 1, 1, 0, 0, 0))
            .video("aaaaaaaaaaa")
            .duration("PT1M")
            .build()];
        let report = enricher.enrich(&mut entries).await.unwrap();

        assert_eq!(report.requested, 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_file_cache_roundtrip_and_corruption() {
        let dir = create_temp_dir();
        let cache = FileMetadataCache::new(dir.path().join("metadata"));
        cache.put_many(&[metadata("aaaaaaaaaaa")]).await.unwrap();
        tokio::fs::write(dir.path().join("metadata").join("bbbbbbbbbbb.json.gz"), b"garbage")
            .await
            .unwrap();

        let ids = [
            VideoId::from("aaaaaaaaaaa"),
            VideoId::from("bbbbbbbbbbb"),
            VideoId::from("ccccccccccc"),
        ];
        let found = cache.get_many(&ids).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&ids[0]].category_id, Some(20));
    }

    #[test]
    fn test_enrichment_years() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(enrichment_years(&[2025, 2024, 2022, 2019], today), vec![2024, 2022]);
        assert_eq!(enrichment_years(&[2025], today), Vec::<i32>::new());
        assert_eq!(enrichment_years(&[2020, 2023, 2021], today), vec![2023, 2021]);
    }
}
