//! Watch engine configuration
//!
//! Loaded from TOML; every field is optional:
//!
//! ```toml
//! poll_interval_ms = 500
//! match_mode = "substring"   # or "glob"
//! exclude = ["target/", "*.swp"]
//! ```

use crate::error::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const MIN_POLL_INTERVAL_MS: u64 = 1;
const MAX_POLL_INTERVAL_MS: u64 = 3_600_000;

/// How the wildcard in a watch pattern is matched against candidate paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Path contains the text before and the text after the wildcard anywhere.
    /// `*.txt` matches `notes.txt.bak`.
    #[default]
    Substring,
    /// Path starts with the text before and ends with the text after the
    /// wildcard, and the wildcard does not span a path separator.
    Glob,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Delay between poll ticks (default: 500ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wildcard matching mode (default: substring)
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Gitignore-syntax patterns skipped during wildcard expansion
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            match_mode: MatchMode::default(),
            exclude: vec![],
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl WatcherConfig {
    /// Parse a TOML document (no range validation)
    pub fn from_toml_str(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load, parse and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| WatchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&contents).map_err(|source| WatchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(WatchError::InvalidConfig(format!(
                "poll_interval_ms must be in {}..={}, got {}",
                MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS, self.poll_interval_ms
            )));
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
