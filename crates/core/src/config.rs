//! Board configuration.
//!
//! Read from a JSON file; every field has a default so a partial (or
//! missing) file is valid.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nextrip_transit::StopNumber;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DEPARTURES_URL: &str = "https://svc.metrotransit.org/NexTrip/{stop}?format=json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Departures endpoint; `{stop}` is replaced with the stop number
    pub departures_url: String,
    /// Stop lookup endpoint returning `stop_id`/`stop_name`/`stop_lat`/`stop_lon`
    pub stop_url: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            departures_url: DEFAULT_DEPARTURES_URL.to_string(),
            stop_url: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub refresh_interval_secs: u64,
    pub default_lead_minutes: u32,
    /// Stops to put on the board at startup
    pub stops: Vec<StopNumber>,
    pub feed: FeedConfig,
    /// Where bookmarked stops are stored
    pub bookmarks_dir: Option<PathBuf>,
    /// JSON stop catalogue used for nearby-stop lookups
    pub catalogue: Option<PathBuf>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
            default_lead_minutes: 5,
            stops: Vec::new(),
            feed: FeedConfig::default(),
            bookmarks_dir: None,
            catalogue: None,
        }
    }
}

impl BoardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid("refresh_interval_secs must be positive".into()));
        }
        if !self.feed.departures_url.contains("{stop}") {
            return Err(ConfigError::Invalid(
                "feed.departures_url must contain {stop}".into(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: BoardConfig = serde_json::from_str(r#"{"stops": ["56043", "17940"]}"#).unwrap();

        assert_eq!(config.refresh_interval_secs, 30);
        assert_eq!(config.default_lead_minutes, 5);
        assert_eq!(config.stops, vec![StopNumber::new("56043"), StopNumber::new("17940")]);
        assert_eq!(config.feed.departures_url, DEFAULT_DEPARTURES_URL);
        assert_eq!(config.catalogue, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = BoardConfig {
            refresh_interval_secs: 0,
            ..BoardConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_requires_stop_placeholder() {
        let mut config = BoardConfig::default();
        config.feed.departures_url = "https://example.test/NexTrip".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = BoardConfig::load(Path::new("/nonexistent/nextrip.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
