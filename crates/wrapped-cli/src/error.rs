//! Application-wide error types using thiserror.

use wrapped_common::WrappedError;

/// Error type of the command-line application.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    /// Failure reported by the library crates.
    #[error(transparent)]
    Wrapped(#[from] WrappedError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be encoded.
    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    /// A command was used in a way the configuration does not allow.
    #[error("{0}")]
    Usage(String),
}

/// Result type for the command-line application.
pub type CliResult<T> = Result<T, CliError>;
