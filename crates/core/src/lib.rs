//! Core types for Pollwatch
//!
//! This crate provides:
//! - The observed-entry data model handed to watch callbacks
//! - The error taxonomy shared by the engine
//! - Engine configuration (TOML-loadable)

pub mod config;
pub mod entry;
pub mod error;

// Re-exports
pub use config::{MatchMode, WatcherConfig};
pub use entry::{Entry, EntryKind, EntryStatus};
pub use error::{Result, WatchError};
