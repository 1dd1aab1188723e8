//! YouTube Data API v3 client with rate limiting.

use crate::enrichment::{MetadataSource, VideoMetadata};
use crate::thumbnails::ThumbnailSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use url::Url;
use wrapped_common::{ChannelId, Result, VideoId, WrappedError};
use wrapped_config::{EnrichmentConfig, MAX_BATCH_SIZE};

const VIDEO_PARTS: &str = "snippet,contentDetails,statistics,status";

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: VideoSnippet,
    #[serde(default)]
    content_details: ContentDetails,
    #[serde(default)]
    statistics: Statistics,
    #[serde(default)]
    status: Status,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VideoSnippet {
    published_at: Option<DateTime<Utc>>,
    channel_id: Option<String>,
    channel_title: Option<String>,
    tags: Option<Vec<String>>,
    category_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentDetails {
    duration: Option<String>,
}

// Counts arrive as decimal strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Status {
    made_for_kids: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    #[serde(default)]
    snippet: ChannelSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChannelSnippet {
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Thumbnails {
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

fn parse_count(raw: Option<&String>) -> Option<u64> {
    raw.and_then(|s| s.parse().ok())
}

impl From<VideoItem> for VideoMetadata {
    fn from(item: VideoItem) -> Self {
        Self {
            video_id: VideoId(item.id),
            channel_name: item.snippet.channel_title,
            channel_id: item.snippet.channel_id,
            category_id: item.snippet.category_id.and_then(|id| id.parse().ok()),
            published_at: item.snippet.published_at,
            tags: item.snippet.tags,
            view_count: parse_count(item.statistics.view_count.as_ref()),
            like_count: parse_count(item.statistics.like_count.as_ref()),
            comment_count: parse_count(item.statistics.comment_count.as_ref()),
            made_for_kids: item.status.made_for_kids,
            duration: item.content_details.duration.unwrap_or_default(),
        }
    }
}

/// Parses a `videos` list response body.
pub fn parse_videos_response(body: &str) -> Result<Vec<VideoMetadata>> {
    let response: ListResponse<VideoItem> = serde_json::from_str(body)?;
    Ok(response.items.into_iter().map(VideoMetadata::from).collect())
}

/// Parses a `channels` list response body into the default thumbnail URL.
pub fn parse_channel_thumbnail(body: &str) -> Result<Option<String>> {
    let response: ListResponse<ChannelItem> = serde_json::from_str(body)?;
    Ok(response
        .items
        .into_iter()
        .next()
        .and_then(|item| item.snippet.thumbnails.default)
        .map(|thumbnail| thumbnail.url))
}

/// Rate-limited client for the `videos` and `channels` endpoints.
#[derive(Clone)]
pub struct YouTubeDataClient {
    client: Client,
    base_url: String,
    api_key: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl YouTubeDataClient {
    /// Builds a client; fails when no API key is configured.
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| WrappedError::config("enrichment.api_key is required for enrichment"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| WrappedError::network_with_source("Failed to create HTTP client", e))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second)
                .ok_or_else(|| WrappedError::config("Rate limit must be greater than 0"))?,
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            rate_limiter: Arc::new(DefaultDirectRateLimiter::direct(quota)),
        })
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{endpoint}", self.base_url))
            .map_err(|e| WrappedError::config_with_source("Invalid enrichment.base_url", e))?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    #[instrument(skip(self, params), fields(endpoint = %endpoint))]
    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let url = self.endpoint_url(endpoint, params)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!("YouTube API returned {}", status);
            return Err(WrappedError::network_with_status(
                format!("YouTube API returned {status} for {endpoint}"),
                status.as_u16(),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WrappedError::network_with_source("Failed to read response body", e))?;
        debug!("Received {} bytes", body.len());
        Ok(body)
    }
}

#[async_trait]
impl MetadataSource for YouTubeDataClient {
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn fetch(&self, ids: &[VideoId]) -> Result<Vec<VideoMetadata>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > MAX_BATCH_SIZE {
            return Err(WrappedError::validation_field(
                format!("at most {MAX_BATCH_SIZE} ids per request, got {}", ids.len()),
                "ids",
            ));
        }

        let joined = ids
            .iter()
            .map(VideoId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let body = self
            .get("videos", &[("part", VIDEO_PARTS), ("id", joined.as_str())])
            .await?;
        let items = parse_videos_response(&body)?;
        info!("Fetched metadata for {} of {} videos", items.len(), ids.len());
        Ok(items)
    }
}

#[async_trait]
impl ThumbnailSource for YouTubeDataClient {
    async fn channel_thumbnail(&self, channel: &ChannelId) -> Result<Option<String>> {
        let body = self
            .get("channels", &[("part", "snippet"), ("id", channel.as_str())])
            .await?;
        parse_channel_thumbnail(&body)
    }
}
