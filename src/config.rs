use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants;
use crate::error::{RefineryError, Result};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub link_check: LinkCheckConfig,
    pub geocoding: GeocodingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkCheckConfig {
    /// Per-probe timeout in seconds.
    pub timeout_seconds: u64,
    /// Bounded worker count for concurrent probes.
    pub concurrency: u32,
    /// Domains rejected without a network call.
    pub excluded_domains: Vec<String>,
}

impl Default for LinkCheckConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 4,
            concurrency: 20,
            excluded_domains: constants::EXCLUDED_LINK_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub endpoint: String,
    /// Minimum inter-call spacing, expressed as a per-minute budget.
    pub requests_per_min: u64,
    /// Retry budget handed to the geocoding adapter.
    pub max_retries: u32,
    /// Country qualifier appended to every query.
    pub country: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            requests_per_min: 50,
            max_retries: 2,
            country: constants::GEOCODING_COUNTRY.to_string(),
        }
    }
}

impl Config {
    /// Loads `config.toml` from the working directory. A missing file falls
    /// back to defaults; a malformed file is a fatal configuration error.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            RefineryError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_from(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.link_check.concurrency, 20);
        assert_eq!(config.geocoding.country, "Canada");
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[link_check]\nconcurrency = 5\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.link_check.concurrency, 5);
        assert_eq!(config.link_check.timeout_seconds, 4);
        assert_eq!(config.geocoding.max_retries, 2);
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "link_check = \"not a table\"").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
