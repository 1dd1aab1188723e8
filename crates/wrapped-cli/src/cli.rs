//! Command-line arguments.

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use wrapped_common::UserId;

/// Top-level arguments.
#[derive(Debug, Parser)]
#[command(name = "yt-wrapped")]
#[command(about = "Year-over-year statistics from a YouTube watch-history export")]
#[command(version)]
pub struct Cli {
    /// Configuration file (YAML or TOML)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a Google Takeout watch-history.json
    Import {
        /// Archive owner
        #[arg(long)]
        user: UserId,

        /// Path to watch-history.json
        file: PathBuf,
    },
    /// List years with imported history
    Years {
        /// Archive owner
        #[arg(long)]
        user: UserId,
    },
    /// Fetch video metadata for recent years
    #[command(long_about = "Fetch category, duration and tags for watched videos. \
        Without --year, the two most recent complete years are enriched.")]
    Enrich {
        /// Archive owner
        #[arg(long)]
        user: UserId,

        /// Year to enrich (repeatable)
        #[arg(long = "year", value_name = "YEAR")]
        years: Vec<i32>,

        /// Reference date for choosing default years
        #[arg(long, value_name = "YYYY-MM-DD")]
        today: Option<NaiveDate>,
    },
    /// Print the yearly summary as JSON
    Wrapped {
        /// Archive owner
        #[arg(long)]
        user: UserId,

        /// Year to summarize
        #[arg(long)]
        year: i32,

        /// Year to compare categories against
        #[arg(long, value_name = "YEAR")]
        compare: Option<i32>,

        /// Pretty-print the JSON
        #[arg(long, action = ArgAction::SetTrue)]
        pretty: bool,

        /// Resolve channel thumbnails for the top creators
        #[arg(long, action = ArgAction::SetTrue)]
        thumbnails: bool,
    },
}
