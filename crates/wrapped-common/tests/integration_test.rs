//! Integration tests for wrapped-common crate.

use chrono::{TimeZone, Utc};
use wrapped_common::{
    channel_id_from_url, extract_video_id, normalize_whitespace, Availability,
    ChannelId, UserId, VideoId, WatchHistoryEntry, WrappedError,
};

#[test]
fn test_identifier_display() {
    assert_eq!(format!("{}", VideoId::from("dQw4w9WgXcQ")), "dQw4w9WgXcQ");
    assert_eq!(format!("{}", ChannelId("UCabc".to_string())), "UCabc");
    assert_eq!(format!("{}", UserId::try_new("alice").unwrap()), "alice");
}

#[test]
fn test_entry_serialization_roundtrip_keeps_metadata() {
    let time = Utc.with_ymd_and_hms(2024, 7, 15, 10, 0, 0).unwrap();
    let mut entry = WatchHistoryEntry::new("Video", time);
    entry.video_id = extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    entry.category_id = Some(10);
    entry.duration = "PT3M33S".to_string();
    entry.tags = Some(vec!["music".to_string()]);

    let json = serde_json::to_string(&entry).unwrap();
    let back: WatchHistoryEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(back, entry);
}

#[test]
fn test_year_array_with_bad_fields_still_loads() {
    let json = r#"[
        {"title": "a", "time_watched": "2023-02-01T00:00:00Z", "tags": 5},
        {"title": "b", "time_watched": "2023-02-02T00:00:00Z", "category_id": null, "like_count": "many"}
    ]"#;
    let entries: Vec<WatchHistoryEntry> = serde_json::from_str(json).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].tags.is_none());
    assert!(entries[1].like_count.is_none());
}

#[test]
fn test_url_helpers() {
    assert_eq!(
        channel_id_from_url(Some("https://www.youtube.com/channel/UCxyz")).as_str(),
        "UCxyz"
    );
    assert_eq!(normalize_whitespace(" A  B "), "a b");
}

#[test]
fn test_availability_from_no_data() {
    let availability: Availability<()> =
        Availability::from_result(Err(WrappedError::no_data(2020)));
    assert_eq!(
        availability,
        Availability::Unavailable {
            reason: "No watch history available for 2020".to_string()
        }
    );
}
