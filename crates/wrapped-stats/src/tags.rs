//! Tag frequency extraction.

use crate::traits::Aggregator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};
use wrapped_common::{normalize_whitespace, WatchHistoryEntry};
use wrapped_config::DEFAULT_TOP_TAGS;

/// How often a normalized tag appeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFrequency {
    /// Lowercased, trimmed tag.
    pub tag: String,
    /// Entries carrying the tag.
    pub count: u64,
}

/// Tag frequencies and the number of entries whose tags were unusable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    /// Most frequent tags, most common first.
    pub tags: Vec<TagFrequency>,
    /// Entries whose tag list could not be decoded.
    pub failures: usize,
}

/// Aggregator for tag frequencies
#[derive(Debug, Clone)]
pub struct TagExtractor {
    limit: usize,
}

impl TagExtractor {
    /// Create an extractor keeping the default number of tags
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_TOP_TAGS)
    }

    /// Keep at most `limit` tags
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }
}

impl Default for TagExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator for TagExtractor {
    type Output = TagSummary;

    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    fn aggregate(&self, entries: &[WatchHistoryEntry]) -> TagSummary {
        let mut counts: HashMap<String, u64> = HashMap::new();
        let mut failures = 0;

        for entry in entries {
            let Some(tags) = &entry.tags else {
                failures += 1;
                continue;
            };
            for tag in tags {
                let normalized = normalize_whitespace(tag);
                if !normalized.is_empty() {
                    *counts.entry(normalized).or_insert(0) += 1;
                }
            }
        }

        let mut tags: Vec<TagFrequency> = counts
            .into_iter()
            .map(|(tag, count)| TagFrequency { tag, count })
            .collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        tags.truncate(self.limit);

        debug!("Extracted {} tags, {} entries without usable tags", tags.len(), failures);
        TagSummary { tags, failures }
    }

    fn name(&self) -> &'static str {
        "tags"
    }
}
