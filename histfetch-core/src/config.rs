//! TOML-loadable fetch settings.
//!
//! ```toml
//! save_path = "data/raw"
//! retries = 3
//! delay_secs = 5
//! ```
//!
//! Every key is optional; missing keys take the documented defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetcher::{FetchRequest, DEFAULT_DELAY, DEFAULT_RETRIES, DEFAULT_SAVE_PATH};

/// Errors from loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Directory the CSV artifact is written to.
    pub save_path: PathBuf,
    /// Total number of provider calls before giving up.
    pub retries: u32,
    /// Pause between failed attempts, in seconds.
    pub delay_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from(DEFAULT_SAVE_PATH),
            retries: DEFAULT_RETRIES,
            delay_secs: DEFAULT_DELAY.as_secs(),
        }
    }
}

impl FetchConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: FetchConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retries == 0 {
            return Err(ConfigError::Invalid("retries must be at least 1".into()));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// Build a request for `symbol` over `[start, end)` using these settings.
    pub fn request(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> FetchRequest {
        FetchRequest::new(symbol, start, end)
            .with_save_path(&self.save_path)
            .with_retries(self.retries)
            .with_delay(self.retry_delay())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = FetchConfig::from_toml_str("").unwrap();
        assert_eq!(config, FetchConfig::default());
        assert_eq!(config.save_path, PathBuf::from("data/raw"));
        assert_eq!(config.retries, 3);
        assert_eq!(config.retry_delay(), Duration::from_secs(5));
    }

    #[test]
    fn partial_override() {
        let config = FetchConfig::from_toml_str("retries = 5\n").unwrap();
        assert_eq!(config.retries, 5);
        assert_eq!(config.delay_secs, 5);
    }

    #[test]
    fn zero_retries_rejected() {
        let err = FetchConfig::from_toml_str("retries = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = FetchConfig::from_toml_str("retry = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn request_carries_settings() {
        let config = FetchConfig {
            save_path: PathBuf::from("out"),
            retries: 2,
            delay_secs: 0,
        };
        let req = config.request(
            "MSFT",
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        );
        assert_eq!(req.symbol, "MSFT");
        assert_eq!(req.save_path, PathBuf::from("out"));
        assert_eq!(req.max_attempts, 2);
        assert_eq!(req.retry_delay, Duration::ZERO);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = FetchConfig::from_file(Path::new("/nonexistent/histfetch.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
