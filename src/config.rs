//! Read-only application configuration.
//!
//! Loaded once at startup from `<config_dir>/balltracker/config.toml`. The file is
//! optional and every field falls back to its default, so a fresh install runs
//! without any setup. Nothing is ever written back.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const CONFIG_DIR: &str = "balltracker";
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_TOPIC: &str = "marvel_AUS/ai_pub";
pub const DEFAULT_FIELD_IMAGE: &str = "images/PitchCorrect.png";
pub const DEFAULT_BALL_IMAGE: &str = "images/AFLBall.png";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Topic pre-filled in the settings panel
    pub default_topic: String,
    /// Background image stretched over the whole canvas
    pub field_image: PathBuf,
    /// Marker image drawn at the tracked position
    pub ball_image: PathBuf,
    /// Directory the certificate pickers open in
    pub certificate_dir: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            default_topic: DEFAULT_TOPIC.to_string(),
            field_image: PathBuf::from(DEFAULT_FIELD_IMAGE),
            ball_image: PathBuf::from(DEFAULT_BALL_IMAGE),
            certificate_dir: None,
        }
    }
}

impl TrackerConfig {
    /// Loads the config from the user's config directory, or defaults if there is none.
    pub async fn load() -> Result<Self, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path).await,
            None => {
                debug!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        if !exists {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

fn config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = TrackerConfig::parse("").unwrap();
        assert_eq!(config, TrackerConfig::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config = TrackerConfig::parse(
            r#"
            default_topic = "field/one/ball"
            certificate_dir = "/etc/balltracker/certs"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_topic, "field/one/ball");
        assert_eq!(
            config.certificate_dir,
            Some(PathBuf::from("/etc/balltracker/certs"))
        );
        assert_eq!(config.field_image, PathBuf::from(DEFAULT_FIELD_IMAGE));
        assert_eq!(config.ball_image, PathBuf::from(DEFAULT_BALL_IMAGE));
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(TrackerConfig::parse("default_topic = [").is_err());
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("balltracker-does-not-exist/config.toml");
        let config = TrackerConfig::load_from(&path).await.unwrap();
        assert_eq!(config, TrackerConfig::default());
    }
}
