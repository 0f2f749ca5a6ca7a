//! Error taxonomy for the watch engine

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for watch engine operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Failures the engine surfaces to its caller.
///
/// Missing watch targets, transient stat failures and duplicate
/// registrations are deliberately absent: those degrade to diagnostics.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The background poller thread could not be started
    #[error("failed to start poller thread: {0}")]
    Spawn(#[source] io::Error),

    /// Config file could not be read
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML for [`WatcherConfig`](crate::WatcherConfig)
    #[error("failed to parse config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Config values out of range
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// An exclude pattern failed to compile
    #[error("invalid exclude pattern `{pattern}`: {message}")]
    InvalidExclude { pattern: String, message: String },
}
