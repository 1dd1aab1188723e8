//! Runtime validation of loaded configuration.

use crate::defaults::MAX_BATCH_SIZE;
use crate::schema::Config;
use wrapped_common::{Result, WrappedError};

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration. The error message names the offending field.
    pub fn validate(config: &Config) -> Result<()> {
        let enrichment = &config.enrichment;
        if enrichment.batch_size == 0 || enrichment.batch_size > MAX_BATCH_SIZE {
            return Err(invalid(format!(
                "enrichment.batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                enrichment.batch_size
            )));
        }
        if enrichment.requests_per_second == 0 {
            return Err(invalid("enrichment.requests_per_second must be positive"));
        }
        if enrichment.timeout_seconds == 0 {
            return Err(invalid("enrichment.timeout_seconds must be positive"));
        }
        if enrichment.base_url.trim().is_empty() {
            return Err(invalid("enrichment.base_url cannot be empty"));
        }
        if enrichment.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(invalid("enrichment.api_key cannot be blank when set"));
        }

        let aggregation = &config.aggregation;
        if aggregation.session_gap_minutes == 0 {
            return Err(invalid("aggregation.session_gap_minutes must be positive"));
        }
        if !aggregation.milestone_hours.is_finite() || aggregation.milestone_hours <= 0.0 {
            return Err(invalid("aggregation.milestone_hours must be a positive number"));
        }
        if !(-12..=14).contains(&aggregation.timezone_offset_hours) {
            return Err(invalid(format!(
                "aggregation.timezone_offset_hours must be between -12 and 14, got {}",
                aggregation.timezone_offset_hours
            )));
        }
        for (field, value) in [
            ("aggregation.top_categories", aggregation.top_categories),
            ("aggregation.top_creators", aggregation.top_creators),
            ("aggregation.top_tags", aggregation.top_tags),
            (
                "aggregation.top_videos_per_category",
                aggregation.top_videos_per_category,
            ),
        ] {
            if value == 0 {
                return Err(invalid(format!("{field} must be positive")));
            }
        }

        if config.cache.aggregate_capacity == 0 {
            return Err(invalid("cache.aggregate_capacity must be positive"));
        }
        if config.cache.thumbnail_capacity == 0 {
            return Err(invalid("cache.thumbnail_capacity must be positive"));
        }

        if config.logging.level.trim().is_empty() {
            return Err(invalid("logging.level cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> WrappedError {
    WrappedError::config(message)
}
