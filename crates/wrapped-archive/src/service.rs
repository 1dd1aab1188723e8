//! The caller-facing entry point: archive in, yearly aggregates out.

use crate::enrichment::{Enricher, EnrichmentReport};
use crate::ingest::{import_archive, parse_takeout, ImportSummary};
use crate::store::ArchiveStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use wrapped_common::{Availability, Result, UserId, WatchHistoryEntry};
use wrapped_config::{AggregationConfig, Config};
use wrapped_stats::{AggregateCache, AggregateKey, YearlyAggregate, YearlyAggregator};

/// Loads archives, aggregates years, and caches the results.
pub struct WrappedService {
    store: Arc<dyn ArchiveStore>,
    cache: AggregateCache,
    aggregator: YearlyAggregator,
    limits: AggregationConfig,
}

impl WrappedService {
    /// Create a service over `store`, configured from `config`
    pub fn new(store: Arc<dyn ArchiveStore>, config: &Config) -> Self {
        Self {
            store,
            cache: AggregateCache::new(&config.cache),
            aggregator: YearlyAggregator::new(&config.aggregation),
            limits: config.aggregation.clone(),
        }
    }

    /// The aggregate cache, for metrics.
    pub fn cache(&self) -> &AggregateCache {
        &self.cache
    }

    /// The aggregate for `year`, or `NoData` when the year was never imported.
    pub async fn yearly(&self, user: &UserId, year: i32) -> Result<Arc<YearlyAggregate>> {
        self.yearly_compared(user, year, None).await
    }

    /// The aggregate for `year` with a category comparison against `compare`.
    ///
    /// A missing comparison year compares against an empty year. Results are
    /// validated before they are cached; an invalid result is returned as an
    /// error and never cached.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn yearly_compared(
        &self,
        user: &UserId,
        year: i32,
        compare: Option<i32>,
    ) -> Result<Arc<YearlyAggregate>> {
        let key = AggregateKey::new(user.clone(), year, compare);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let (current, previous) = match compare {
            Some(previous_year) => {
                let (current, previous) = tokio::join!(
                    self.store.load_year(user, year),
                    self.store.load_year(user, previous_year)
                );
                (current?, Some((previous_year, comparison_entries(previous)?)))
            }
            None => (self.store.load_year(user, year).await?, None),
        };

        let aggregate = self.aggregator.aggregate(
            year,
            &current,
            previous
                .as_ref()
                .map(|(previous_year, entries)| (*previous_year, entries.as_slice())),
        );
        aggregate.validate(&self.limits)?;

        let aggregate = Arc::new(aggregate);
        self.cache.insert(key, Arc::clone(&aggregate)).await;
        Ok(aggregate)
    }

    /// Like [`Self::yearly_compared`], with failures folded into
    /// [`Availability::Unavailable`].
    pub async fn yearly_or_unavailable(
        &self,
        user: &UserId,
        year: i32,
        compare: Option<i32>,
    ) -> Availability<Arc<YearlyAggregate>> {
        let result = self.yearly_compared(user, year, compare).await;
        if let Err(e) = &result {
            warn!(user = %user, year, "Yearly aggregate unavailable: {}", e);
        }
        Availability::from_result(result)
    }

    /// Imported years, most recent first.
    pub async fn available_years(&self, user: &UserId) -> Result<Vec<i32>> {
        self.store.available_years(user).await
    }

    /// Parses and persists a Takeout export, replacing cached aggregates.
    #[instrument(skip(self, takeout_json), fields(user = %user))]
    pub async fn import(&self, user: &UserId, takeout_json: &str) -> Result<ImportSummary> {
        let entries = parse_takeout(takeout_json)?;
        let summary = import_archive(self.store.as_ref(), user, entries).await?;
        self.cache.invalidate_user(user).await;
        Ok(summary)
    }

    /// Enriches and re-persists each of `years`. Years without data are skipped.
    #[instrument(skip(self, enricher), fields(user = %user))]
    pub async fn enrich(
        &self,
        user: &UserId,
        years: &[i32],
        enricher: &Enricher,
    ) -> Result<BTreeMap<i32, EnrichmentReport>> {
        let mut reports = BTreeMap::new();
        for &year in years {
            let mut entries = match self.store.load_year(user, year).await {
                Ok(entries) => entries,
                Err(e) if e.is_no_data() => {
                    warn!(year, "Skipping enrichment of a year without data");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let report = enricher.enrich(&mut entries).await?;
            if report.enriched_entries > 0 {
                self.store.save_year(user, year, &entries).await?;
            } else {
                debug!(year, "No entries changed");
            }
            reports.insert(year, report);
        }

        self.cache.invalidate_user(user).await;
        info!("Enriched {} years", reports.len());
        Ok(reports)
    }
}

fn comparison_entries(loaded: Result<Vec<WatchHistoryEntry>>) -> Result<Vec<WatchHistoryEntry>> {
    match loaded {
        Err(e) if e.is_no_data() => Ok(Vec::new()),
        other => other,
    }
}
