//! Channel thumbnail lookup with an in-process cache.

use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use tracing::{debug, warn};
use wrapped_common::{ChannelId, Result};

/// Shown when a channel has no known thumbnail.
pub const PLACEHOLDER_THUMBNAIL: &str =
    "https://www.youtube.com/img/desktop/unavailable/unavailable_video.png";

/// Remote provider of channel avatars.
#[async_trait]
pub trait ThumbnailSource: Send + Sync {
    /// Thumbnail URL of a channel, `None` when the channel is unknown.
    async fn channel_thumbnail(&self, channel: &ChannelId) -> Result<Option<String>>;
}

/// Resolves channel thumbnails, remembering successful lookups.
pub struct ChannelThumbnails {
    source: Arc<dyn ThumbnailSource>,
    cache: Cache<ChannelId, String>,
}

impl ChannelThumbnails {
    /// Create a resolver remembering up to `capacity` channels
    pub fn new(source: Arc<dyn ThumbnailSource>, capacity: u64) -> Self {
        Self {
            source,
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Thumbnail URL for `channel`, or [`PLACEHOLDER_THUMBNAIL`].
    ///
    /// Placeholders are never cached so a later lookup can still succeed.
    pub async fn thumbnail(&self, channel: &ChannelId) -> String {
        if channel.is_empty() {
            return PLACEHOLDER_THUMBNAIL.to_string();
        }
        if let Some(url) = self.cache.get(channel).await {
            return url;
        }

        match self.source.channel_thumbnail(channel).await {
            Ok(Some(url)) => {
                self.cache.insert(channel.clone(), url.clone()).await;
                url
            }
            Ok(None) => {
                debug!(channel = %channel, "No thumbnail for channel");
                PLACEHOLDER_THUMBNAIL.to_string()
            }
            Err(e) => {
                warn!(channel = %channel, "Thumbnail lookup failed: {}", e);
                PLACEHOLDER_THUMBNAIL.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wrapped_common::WrappedError;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ThumbnailSource for CountingSource {
        async fn channel_thumbnail(&self, channel: &ChannelId) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match channel.as_str() {
                "UCbroken" => Err(WrappedError::network("boom")),
                "UCmissing" => Ok(None),
                id => Ok(Some(format!("https://img.example/{id}.jpg"))),
            }
        }
    }

    #[tokio::test]
    async fn test_successful_lookups_are_cached() {
        let source = Arc::new(CountingSource::default());
        let thumbnails = ChannelThumbnails::new(source.clone(), 10);
        let channel = ChannelId("UCgame".to_string());

        assert_eq!(thumbnails.thumbnail(&channel).await, "https://img.example/UCgame.jpg");
        assert_eq!(thumbnails.thumbnail(&channel).await, "https://img.example/UCgame.jpg");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_placeholder_paths() {
        let source = Arc::new(CountingSource::default());
        let thumbnails = ChannelThumbnails::new(source.clone(), 10);

        assert_eq!(thumbnails.thumbnail(&ChannelId::default()).await, PLACEHOLDER_THUMBNAIL);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        let broken = ChannelId("UCbroken".to_string());
        assert_eq!(thumbnails.thumbnail(&broken).await, PLACEHOLDER_THUMBNAIL);
        assert_eq!(thumbnails.thumbnail(&broken).await, PLACEHOLDER_THUMBNAIL);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        let missing = ChannelId("UCmissing".to_string());
        assert_eq!(thumbnails.thumbnail(&missing).await, PLACEHOLDER_THUMBNAIL);
    }
}
