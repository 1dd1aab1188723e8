//! Command handlers.
//!
//! Handlers write their results to the given writer; notices and logs go to
//! stderr.

use crate::cli::Command;
use crate::error::{CliError, CliResult};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};
use wrapped_archive::{
    enrichment_years, ArchiveStore, ChannelThumbnails, Enricher, FileArchiveStore,
    FileMetadataCache, MemoryMetadataCache, MetadataCache, WrappedService, YouTubeDataClient,
};
use wrapped_common::{Availability, UserId};
use wrapped_config::Config;
use wrapped_stats::{placeholder_aggregate, YearlyAggregate};

#[derive(Serialize)]
struct WrappedOutput<'a> {
    #[serde(flatten)]
    aggregate: &'a YearlyAggregate,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    placeholder: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    thumbnails: BTreeMap<String, String>,
}

/// Runs one command against the archive configured in `config`.
pub async fn run(command: Command, config: &Config, out: &mut dyn Write) -> CliResult<()> {
    let store: Arc<dyn ArchiveStore> = Arc::new(FileArchiveStore::new(&config.archive.data_dir));
    let service = WrappedService::new(store, config);

    match command {
        Command::Import { user, file } => import(&service, &user, &file, out).await,
        Command::Years { user } => years(&service, &user, out).await,
        Command::Enrich { user, years, today } => {
            enrich(&service, config, &user, years, today, out).await
        }
        Command::Wrapped {
            user,
            year,
            compare,
            pretty,
            thumbnails,
        } => {
            let request = WrappedRequest {
                year,
                compare,
                pretty,
                thumbnails,
            };
            wrapped(&service, config, &user, request, out).await
        }
    }
}

#[instrument(skip(service, out), fields(user = %user))]
async fn import(
    service: &WrappedService,
    user: &UserId,
    file: &Path,
    out: &mut dyn Write,
) -> CliResult<()> {
    let json = tokio::fs::read_to_string(file).await?;
    let summary = service.import(user, &json).await?;

    for (year, count) in summary.years.iter().rev() {
        writeln!(out, "{year}\t{count}")?;
    }
    writeln!(out, "total\t{}", summary.total)?;
    Ok(())
}

async fn years(service: &WrappedService, user: &UserId, out: &mut dyn Write) -> CliResult<()> {
    for year in service.available_years(user).await? {
        writeln!(out, "{year}")?;
    }
    Ok(())
}

#[instrument(skip(service, config, out), fields(user = %user))]
async fn enrich(
    service: &WrappedService,
    config: &Config,
    user: &UserId,
    years: Vec<i32>,
    today: Option<NaiveDate>,
    out: &mut dyn Write,
) -> CliResult<()> {
    if !config.enrichment.enabled {
        return Err(CliError::Usage(
            "enrichment is disabled (enrichment.enabled = false)".to_string(),
        ));
    }

    let years = if years.is_empty() {
        let today = today.unwrap_or_else(|| Utc::now().date_naive());
        enrichment_years(&service.available_years(user).await?, today)
    } else {
        years
    };
    if years.is_empty() {
        writeln!(out, "no complete years to enrich")?;
        return Ok(());
    }

    let cache: Arc<dyn MetadataCache> = match &config.enrichment.cache_dir {
        Some(dir) => Arc::new(FileMetadataCache::new(dir)),
        None => Arc::new(MemoryMetadataCache::new()),
    };
    let client = YouTubeDataClient::from_config(&config.enrichment)?;
    let enricher = Enricher::with_batch_size(Arc::new(client), cache, config.enrichment.batch_size);

    let reports = service.enrich(user, &years, &enricher).await?;
    for (year, report) in reports.iter().rev() {
        writeln!(
            out,
            "{year}\tenriched={}\tcached={}\tfetched={}\tfailed_batches={}",
            report.enriched_entries, report.cache_hits, report.fetched, report.failed_batches
        )?;
    }
    Ok(())
}

struct WrappedRequest {
    year: i32,
    compare: Option<i32>,
    pretty: bool,
    thumbnails: bool,
}

async fn wrapped(
    service: &WrappedService,
    config: &Config,
    user: &UserId,
    request: WrappedRequest,
    out: &mut dyn Write,
) -> CliResult<()> {
    let (aggregate, placeholder) = match service
        .yearly_or_unavailable(user, request.year, request.compare)
        .await
    {
        Availability::Ready(aggregate) => (aggregate, false),
        Availability::Unavailable { reason } => {
            eprintln!("note: {reason}; showing sample data");
            (Arc::new(placeholder_aggregate(request.year, request.compare)), true)
        }
    };

    let thumbnails = if request.thumbnails && !placeholder {
        creator_thumbnails(config, &aggregate).await?
    } else {
        BTreeMap::new()
    };

    let output = WrappedOutput {
        aggregate: &aggregate,
        placeholder,
        thumbnails,
    };
    if request.pretty {
        serde_json::to_writer_pretty(&mut *out, &output)?;
    } else {
        serde_json::to_writer(&mut *out, &output)?;
    }
    writeln!(out)?;
    info!(year = request.year, placeholder, "Printed yearly summary");
    Ok(())
}

async fn creator_thumbnails(
    config: &Config,
    aggregate: &YearlyAggregate,
) -> CliResult<BTreeMap<String, String>> {
    let client = YouTubeDataClient::from_config(&config.enrichment)?;
    let resolver = ChannelThumbnails::new(Arc::new(client), config.cache.thumbnail_capacity);

    let mut thumbnails = BTreeMap::new();
    for creator in &aggregate.top_creators {
        let url = resolver.thumbnail(&creator.channel_id).await;
        thumbnails.insert(creator.name.clone(), url);
    }
    Ok(thumbnails)
}
