//! # Wrapped Common
//!
//! Shared types, errors, logging, and utilities for YouTube Wrapped.
//!
//! This crate provides the foundational types used across all other crates
//! in the workspace: the watch-history entry model, identifier newtypes,
//! the [`WrappedError`] type, the [`Availability`] result, and tracing setup.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{Result, WrappedError};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use types::*;
pub use utils::*;
