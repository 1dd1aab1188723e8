//! Time-bounded cache of computed yearly aggregates.

use crate::yearly::YearlyAggregate;
use moka::future::Cache;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use wrapped_common::UserId;
use wrapped_config::CacheConfig;

/// Cache key: whose archive, which year, compared against which year.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct AggregateKey {
    /// Archive owner.
    pub user: UserId,
    /// Aggregated year.
    pub year: i32,
    /// Comparison year, if any.
    pub compare_year: Option<i32>,
}

impl AggregateKey {
    /// Create a new key
    pub fn new(user: UserId, year: i32, compare_year: Option<i32>) -> Self {
        Self {
            user,
            year,
            compare_year,
        }
    }
}

impl fmt::Display for AggregateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user, self.year)?;
        if let Some(compare) = self.compare_year {
            write!(f, ":vs_{compare}")?;
        }
        Ok(())
    }
}

/// Cache performance metrics
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Number of cache hits
    pub hits: AtomicU64,
    /// Number of cache misses
    pub misses: AtomicU64,
    /// Number of invalidated entries
    pub invalidations: AtomicU64,
}

impl CacheMetrics {
    /// Record a cache hit
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Get cache hit rate
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let total = hits + self.misses.load(Ordering::Relaxed) as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

/// Bounded, TTL-expiring cache of yearly aggregates.
pub struct AggregateCache {
    cache: Cache<AggregateKey, Arc<YearlyAggregate>>,
    metrics: Arc<CacheMetrics>,
}

impl AggregateCache {
    /// Create a new cache with the given configuration
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.aggregate_capacity)
            .time_to_live(Duration::from_secs(config.aggregate_ttl_seconds))
            .build();

        Self {
            cache,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// Looks up an aggregate, recording a hit or a miss.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn get(&self, key: &AggregateKey) -> Option<Arc<YearlyAggregate>> {
        if let Some(aggregate) = self.cache.get(key).await {
            debug!("Cache hit");
            self.metrics.record_hit();
            Some(aggregate)
        } else {
            debug!("Cache miss");
            self.metrics.record_miss();
            None
        }
    }

    /// Stores an aggregate. Callers validate before inserting.
    #[instrument(skip(self, aggregate), fields(key = %key))]
    pub async fn insert(&self, key: AggregateKey, aggregate: Arc<YearlyAggregate>) {
        self.cache.insert(key, aggregate).await;
    }

    /// Drops every entry belonging to `user`.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn invalidate_user(&self, user: &UserId) {
        let keys: Vec<AggregateKey> = self
            .cache
            .iter()
            .filter(|(key, _)| &key.user == user)
            .map(|(key, _)| (*key).clone())
            .collect();

        let count = keys.len() as u64;
        for key in keys {
            self.cache.invalidate(&key).await;
        }
        self.metrics.invalidations.fetch_add(count, Ordering::Relaxed);
        info!("Invalidated {} cached aggregates", count);
    }

    /// Get cache metrics
    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::placeholder_aggregate;

    fn user(name: &str) -> UserId {
        UserId::try_new(name).unwrap()
    }

    #[test]
    fn test_key_display() {
        assert_eq!(AggregateKey::new(user("alice"), 2024, None).to_string(), "alice:2024");
        assert_eq!(
            AggregateKey::new(user("alice"), 2024, Some(2023)).to_string(),
            "alice:2024:vs_2023"
        );
    }

    #[tokio::test]
    async fn test_get_insert_and_metrics() {
        let cache = AggregateCache::new(&CacheConfig::default());
        let key = AggregateKey::new(user("alice"), 2024, None);

        assert!(cache.get(&key).await.is_none());
        cache.insert(key.clone(), Arc::new(placeholder_aggregate(2024, None))).await;
        let hit = cache.get(&key).await.unwrap();
        assert_eq!(hit.year, 2024);

        let metrics = cache.metrics();
        assert_eq!(metrics.hits.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.misses.load(Ordering::Relaxed), 1);
        assert!((metrics.hit_rate() - 0.5).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_compare_year_is_part_of_key() {
        let cache = AggregateCache::new(&CacheConfig::default());
        cache
            .insert(
                AggregateKey::new(user("alice"), 2024, None),
                Arc::new(placeholder_aggregate(2024, None)),
            )
            .await;
        assert!(cache
            .get(&AggregateKey::new(user("alice"), 2024, Some(2023)))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_invalidate_user_keeps_other_users() {
        let cache = AggregateCache::new(&CacheConfig::default());
        let alice = AggregateKey::new(user("alice"), 2024, None);
        let bob = AggregateKey::new(user("bob"), 2024, None);
        cache.insert(alice.clone(), Arc::new(placeholder_aggregate(2024, None))).await;
        cache.insert(bob.clone(), Arc::new(placeholder_aggregate(2024, None))).await;

        cache.invalidate_user(&user("alice")).await;

        assert!(cache.get(&alice).await.is_none());
        assert!(cache.get(&bob).await.is_some());
    }

    #[tokio::test]
    async fn test_expired_entries_are_not_returned() {
        let config = CacheConfig {
            aggregate_ttl_seconds: 1,
            ..CacheConfig::default()
        };
        let cache = AggregateCache::new(&config);
        let key = AggregateKey::new(user("alice"), 2024, None);
        cache.insert(key.clone(), Arc::new(placeholder_aggregate(2024, None))).await;

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(cache.get(&key).await.is_none());
    }
}
