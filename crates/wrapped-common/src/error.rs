//! Error types and utilities for YouTube Wrapped

use thiserror::Error;

/// Result type alias for Wrapped operations
pub type Result<T> = std::result::Result<T, WrappedError>;

/// Main error type for Wrapped operations
#[derive(Error, Debug)]
pub enum WrappedError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network related errors (HTTP requests, etc.)
    #[error("Network error: {message}")]
    Network {
        /// Human-readable description.
        message: String,
        /// HTTP status, when a response was received.
        status_code: Option<u16>,
        /// Underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Archive store errors (missing directories, unreadable keys)
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable description.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The archive holds no entries for the requested year
    #[error("No watch history available for {year}")]
    NoData {
        /// Requested year.
        year: i32,
    },

    /// Metadata enrichment errors
    #[error("Enrichment error: {message}")]
    Enrichment {
        /// Human-readable description.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors for computed results or user input
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description.
        message: String,
        /// Offending field, if any.
        field: Option<String>,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        /// Human-readable description.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl WrappedError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new generic error with a custom message and source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generic {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            status_code: None,
            source: None,
        }
    }

    /// Create a new network error carrying an HTTP status code
    pub fn network_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Network {
            message: msg.into(),
            status_code: Some(status),
            source: None,
        }
    }

    /// Create a new network error with source
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            status_code: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a new storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new storage error with source
    pub fn storage_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a missing-year error
    pub fn no_data(year: i32) -> Self {
        Self::NoData { year }
    }

    /// Create a new enrichment error
    pub fn enrichment(msg: impl Into<String>) -> Self {
        Self::Enrichment {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new enrichment error with source
    pub fn enrichment_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Enrichment {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Whether this error means the requested year simply has no data
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}

/// Convert from reqwest::Error to WrappedError
impl From<reqwest::Error> for WrappedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err)
        } else if err.is_status() {
            let status_code = err.status().map(|s| s.as_u16()).unwrap_or(0);
            Self::Network {
                message: format!("HTTP error: {}", status_code),
                status_code: Some(status_code),
                source: Some(Box::new(err)),
            }
        } else {
            Self::network_with_source("Network request failed", err)
        }
    }
}
