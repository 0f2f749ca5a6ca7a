//! Polling file system watcher
//!
//! This crate provides a portable, poll-based change notification engine:
//! - Watches on files, directories and single-wildcard patterns
//! - Snapshot diffing into created / modified / removed / renamed batches
//! - Same-tick rename detection by matching mtime and size
//! - One background poller per engine, started on first registration

pub mod engine;
pub mod ignore;
pub mod matcher;
mod poller;
mod registry;
pub mod snapshot;
pub mod touch;
pub mod watch;

// Re-exports
pub use engine::{Registration, Watcher};
pub use matcher::{Matcher, PathPattern, WILDCARD};
pub use pollwatch_core::{Entry, EntryKind, EntryStatus, MatchMode, Result, WatchError, WatcherConfig};
pub use watch::Callback;
