//! # Wrapped Archive
//!
//! Storage and acquisition of watch history for YouTube Wrapped.
//!
//! Takeout exports are parsed by [`ingest`], persisted per user and year in an
//! [`ArchiveStore`], and optionally completed with video metadata by an
//! [`Enricher`]. [`WrappedService`] ties the store to the aggregation pipeline
//! and caches computed years.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod enrichment;
pub mod ingest;
pub mod service;
pub mod store;
pub mod thumbnails;
pub mod youtube;

pub use enrichment::{
    enrichment_years, Enricher, EnrichmentReport, FileMetadataCache, MemoryMetadataCache,
    MetadataCache, MetadataSource, VideoMetadata,
};
pub use ingest::{group_by_year, import_archive, parse_takeout, ImportSummary};
pub use service::WrappedService;
pub use store::{ArchiveStore, FileArchiveStore, MemoryArchiveStore};
pub use thumbnails::{ChannelThumbnails, ThumbnailSource, PLACEHOLDER_THUMBNAIL};
pub use youtube::YouTubeDataClient;
