//! # Wrapped CLI
//!
//! The `yt-wrapped` command-line front end: import a Takeout archive, enrich
//! recent years, and print yearly summaries as JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::{Cli, Command};
pub use commands::run;
pub use error::{CliError, CliResult};
