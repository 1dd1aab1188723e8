//! Configuration loading from YAML or TOML files with environment overrides.

use crate::schema::Config;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use wrapped_common::Result as WrappedResult;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "WRAPPED_CONFIG_PATH";

/// Files searched, in order, when no explicit path is given.
pub const DEFAULT_CONFIG_FILES: [&str; 3] = ["wrapped.yaml", "wrapped.yml", "wrapped.toml"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file extension maps to no known format
    #[error("Unsupported configuration format for '{0}' (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(PathBuf),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParse {
        /// Variable name.
        var: String,
        /// Parse failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration validation error
    #[error("{0}")]
    Validation(String),
}

impl From<ConfigError> for wrapped_common::WrappedError {
    fn from(err: ConfigError) -> Self {
        wrapped_common::WrappedError::config_with_source("Failed to load configuration", err)
    }
}

/// Source file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML (`.yaml` / `.yml`)
    Yaml,
    /// TOML (`.toml`)
    Toml,
}

impl ConfigFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), ?format, "Read configuration file");

        let mut config = Self::parse(&content, format)?;
        Self::apply_env_overrides(&mut config)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Parses configuration text without applying overrides or validation.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
        match format {
            ConfigFormat::Yaml => Ok(serde_yaml::from_str(content)?),
            ConfigFormat::Toml => Ok(toml::from_str(content)?),
        }
    }

    /// Load configuration following the search order: explicit path,
    /// `WRAPPED_CONFIG_PATH`, the default file names, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> WrappedResult<Config> {
        if let Some(path) = explicit {
            info!(path = %path.display(), "Loading configuration");
            return Ok(Self::load_config(path)?);
        }
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            info!(path = %path, "Loading configuration from {CONFIG_PATH_ENV}");
            return Ok(Self::load_config(path)?);
        }
        for candidate in DEFAULT_CONFIG_FILES {
            if Path::new(candidate).exists() {
                info!(path = candidate, "Loading configuration");
                return Ok(Self::load_config(candidate)?);
            }
        }

        debug!("No configuration file found, using defaults");
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Apply process environment overrides to configuration
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides(config, |name| env::var(name).ok())
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("WRAPPED_DATA_DIR") {
            config.archive.data_dir = PathBuf::from(dir);
        }

        if let Some(key) = lookup("YOUTUBE_API_KEY") {
            config.enrichment.api_key = Some(key);
        }

        if let Some(dir) = lookup("WRAPPED_CACHE_DIR") {
            config.enrichment.cache_dir = Some(PathBuf::from(dir));
        }

        if let Some(level) = lookup("WRAPPED_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(offset) = lookup("WRAPPED_TIMEZONE_OFFSET") {
            config.aggregation.timezone_offset_hours =
                offset.trim().parse().map_err(|e| ConfigError::EnvParse {
                    var: "WRAPPED_TIMEZONE_OFFSET".to_string(),
                    source: Box::new(e),
                })?;
        }

        if let Some(gap) = lookup("WRAPPED_SESSION_GAP_MINUTES") {
            config.aggregation.session_gap_minutes =
                gap.trim().parse().map_err(|e| ConfigError::EnvParse {
                    var: "WRAPPED_SESSION_GAP_MINUTES".to_string(),
                    source: Box::new(e),
                })?;
        }

        Ok(())
    }

    fn validate(config: &Config) -> Result<(), ConfigError> {
        config
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wrapped_common::test_utils::config_fixtures;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.yaml")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.YML")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_parse_minimal_yaml_fills_defaults() {
        let config = ConfigLoader::parse(config_fixtures::minimal_config_yaml(), ConfigFormat::Yaml)
            .unwrap();
        assert_eq!(config.archive.data_dir, PathBuf::from("./data"));
        assert_eq!(config.aggregation.session_gap_minutes, 30);
        assert_eq!(config.cache.aggregate_ttl_seconds, 1800);
    }

    #[test]
    fn test_parse_full_yaml() {
        let config =
            ConfigLoader::parse(config_fixtures::full_config_yaml(), ConfigFormat::Yaml).unwrap();
        assert_eq!(config.enrichment.api_key.as_deref(), Some("test_api_key"));
        assert_eq!(config.enrichment.batch_size, 25);
        assert_eq!(config.aggregation.session_gap_minutes, 45);
        assert_eq!(config.aggregation.timezone_offset_hours, 2);
        assert_eq!(config.cache.thumbnail_capacity, 100);
        assert!(config.logging.json);
    }

    #[test]
    fn test_parse_toml() {
        let toml_text = r#"
[aggregation]
session_gap_minutes = 20
timezone_offset_hours = 9

[cache]
aggregate_capacity = 8
"#;
        let config = ConfigLoader::parse(toml_text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.aggregation.session_gap_minutes, 20);
        assert_eq!(config.aggregation.timezone_offset_hours, 9);
        assert_eq!(config.cache.aggregate_capacity, 8);
        assert_eq!(config.aggregation.top_tags, 250);
    }

    #[test]
    fn test_invalid_yaml() {
        let result = ConfigLoader::parse("aggregation: [1, 2", ConfigFormat::Yaml);
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        let lookup = lookup_from(&[
            ("WRAPPED_DATA_DIR", "/tmp/wrapped"),
            ("YOUTUBE_API_KEY", "secret"),
            ("WRAPPED_CACHE_DIR", "/tmp/cache"),
            ("WRAPPED_LOG_LEVEL", "debug"),
            ("WRAPPED_TIMEZONE_OFFSET", "-5"),
            ("WRAPPED_SESSION_GAP_MINUTES", " 15 "),
        ]);
        ConfigLoader::apply_overrides(&mut config, lookup).unwrap();

        assert_eq!(config.archive.data_dir, PathBuf::from("/tmp/wrapped"));
        assert_eq!(config.enrichment.api_key.as_deref(), Some("secret"));
        assert_eq!(config.enrichment.cache_dir, Some(PathBuf::from("/tmp/cache")));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.aggregation.timezone_offset_hours, -5);
        assert_eq!(config.aggregation.session_gap_minutes, 15);
    }

    #[test]
    fn test_apply_overrides_parse_error_names_variable() {
        let mut config = Config::default();
        let lookup = lookup_from(&[("WRAPPED_TIMEZONE_OFFSET", "UTC-6")]);
        let err = ConfigLoader::apply_overrides(&mut config, lookup).unwrap_err();
        assert!(err.to_string().contains("WRAPPED_TIMEZONE_OFFSET"));
    }

    #[test]
    fn test_config_error_converts_to_wrapped_error() {
        let err: wrapped_common::WrappedError = ConfigError::Validation("bad".to_string()).into();
        assert!(matches!(err, wrapped_common::WrappedError::Config { .. }));
    }
}
