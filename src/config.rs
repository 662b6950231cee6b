//! Configuration management for Billscan.
//!
//! Settings come from an optional TOML file with environment-variable
//! overrides (`BILLSCAN_*`), falling back to defaults that work for a
//! local data directory layout.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default composite-confidence threshold for auto-accepting results.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 80.0;

/// Default language code for entity recognition.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default prefix for per-identity notification channels.
pub const DEFAULT_CHANNEL_PREFIX: &str = "private";

/// Default data root for the filesystem-backed collaborators.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Fast ownership-cache tier bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Bound on cached executions; oldest insertions evicted first.
    pub fast_capacity: usize,
    /// Lifetime of a fast-tier entry, in seconds.
    pub fast_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fast_capacity: 200,
            fast_ttl_secs: 3600,
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BillscanConfig {
    /// Composite confidence at or above which results auto-accept.
    pub confidence_threshold: f64,
    /// Language code passed to the entity-recognition collaborator.
    pub language: String,
    /// Prefix for per-identity notification channels.
    pub channel_prefix: String,
    /// Root directory for the filesystem-backed collaborators.
    pub data_dir: PathBuf,
    pub cache: CacheConfig,
}

impl Default for BillscanConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            language: DEFAULT_LANGUAGE.to_string(),
            channel_prefix: DEFAULT_CHANNEL_PREFIX.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            cache: CacheConfig::default(),
        }
    }
}

impl BillscanConfig {
    /// Load configuration: file (if given), then environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path)?;
                toml::from_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply `BILLSCAN_*` environment overrides.
    fn apply_env(&mut self) {
        if let Ok(raw) = std::env::var("BILLSCAN_CONFIDENCE_THRESHOLD") {
            match raw.parse() {
                Ok(value) => self.confidence_threshold = value,
                Err(_) => {
                    tracing::warn!(%raw, "ignoring unparseable BILLSCAN_CONFIDENCE_THRESHOLD")
                }
            }
        }
        if let Ok(value) = std::env::var("BILLSCAN_LANGUAGE") {
            self.language = value;
        }
        if let Ok(value) = std::env::var("BILLSCAN_CHANNEL_PREFIX") {
            self.channel_prefix = value;
        }
        if let Ok(value) = std::env::var("BILLSCAN_DATA_DIR") {
            self.data_dir = PathBuf::from(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BillscanConfig::default();
        assert_eq!(config.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
        assert_eq!(config.language, "en");
        assert_eq!(config.channel_prefix, "private");
        assert_eq!(config.cache.fast_capacity, 200);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: BillscanConfig =
            toml::from_str("confidence_threshold = 65.0\n[cache]\nfast_capacity = 50\n").unwrap();
        assert_eq!(config.confidence_threshold, 65.0);
        assert_eq!(config.cache.fast_capacity, 50);
        assert_eq!(config.cache.fast_ttl_secs, 3600);
        assert_eq!(config.language, "en");
    }
}
