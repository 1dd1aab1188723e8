//! Integration tests for wrapped-archive crate.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use wrapped_archive::{
    enrichment_years, Enricher, FileArchiveStore, FileMetadataCache, MetadataSource,
    VideoMetadata, WrappedService,
};
use wrapped_common::test_utils::{create_temp_dir, entry_fixtures::takeout_json, init_test_logging};
use wrapped_common::{Availability, Result, UserId, VideoId};
use wrapped_config::Config;
use wrapped_stats::placeholder_aggregate;

struct StaticSource;

#[async_trait]
impl MetadataSource for StaticSource {
    async fn fetch(&self, ids: &[VideoId]) -> Result<Vec<VideoMetadata>> {
        Ok(ids
            .iter()
            .map(|id| VideoMetadata {
                video_id: id.clone(),
                channel_name: Some("Resolved".to_string()),
                category_id: Some(27),
                duration: "PT30M".to_string(),
                tags: Some(vec!["lecture".to_string()]),
                ..VideoMetadata::default()
            })
            .collect())
    }
}

#[tokio::test]
async fn test_import_enrich_aggregate_on_disk() {
    init_test_logging();
    let dir = create_temp_dir();
    let store = Arc::new(FileArchiveStore::new(dir.path().join("archive")));
    let service = WrappedService::new(store, &Config::default());
    let user = UserId::try_new("alice").unwrap();

    let summary = service.import(&user, takeout_json()).await.unwrap();
    assert_eq!(summary.total, 3);

    let years = service.available_years(&user).await.unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
    assert_eq!(enrichment_years(&years, today), vec![2024, 2023]);

    let enricher = Enricher::new(
        Arc::new(StaticSource),
        Arc::new(FileMetadataCache::new(dir.path().join("metadata"))),
    );
    let reports = service.enrich(&user, &[2024], &enricher).await.unwrap();
    assert_eq!(reports[&2024].enriched_entries, 2);

    let aggregate = service.yearly(&user, 2024).await.unwrap();
    assert_eq!(aggregate.video_count, 2);
    assert!((aggregate.total_watch_time_hours - 1.0).abs() < 1e-9);
    assert_eq!(aggregate.top_categories[0].name, "Education");
    // The archive channel wins over the fetched one.
    assert!(aggregate.top_creators.iter().any(|c| c.name == "LearnDaily"));
}

#[tokio::test]
async fn test_unavailable_year_falls_back_to_placeholder() {
    let dir = create_temp_dir();
    let service = WrappedService::new(
        Arc::new(FileArchiveStore::new(dir.path())),
        &Config::default(),
    );
    let user = UserId::try_new("nobody").unwrap();

    let availability = service.yearly_or_unavailable(&user, 2022, None).await;
    assert!(matches!(availability, Availability::Unavailable { .. }));

    let shown = availability
        .map(|aggregate| (*aggregate).clone())
        .unwrap_or_else(|_| placeholder_aggregate(2022, None));
    assert_eq!(shown.year, 2022);
    assert!(shown.video_count > 0);
}
