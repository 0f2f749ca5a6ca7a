//! Observed filesystem entries
//!
//! An [`Entry`] is the diffed state of one filesystem object at one point in
//! time. Watches keep the last observed entry per path and hand batches of
//! changed entries to their callbacks.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Lifecycle status of an entry within a change batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// First sighting of the path
    Created,
    /// Modification time, size or kind changed since last poll
    Modified,
    /// Path disappeared and no rename candidate matched it
    Removed,
    /// Path appeared in the same tick another one disappeared with identical mtime and size
    Renamed,
    /// Nothing changed; never emitted in a batch
    Unmodified,
}

/// Kind of filesystem object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    RegularFile,
    Directory,
    Other,
    /// Metadata could not be read
    Unknown,
}

impl From<fs::FileType> for EntryKind {
    fn from(file_type: fs::FileType) -> Self {
        if file_type.is_file() {
            EntryKind::RegularFile
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        }
    }
}

/// One observed filesystem object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Path at time of observation
    pub path: PathBuf,
    /// Path at time of discovery; the old path for renamed entries
    pub last_path: PathBuf,
    /// Change status
    pub status: EntryStatus,
    /// Modification time (`None` if the stat failed)
    pub last_mod_time: Option<SystemTime>,
    /// Byte size (always 0 for directories)
    pub size: u64,
    /// Object kind
    pub kind: EntryKind,
}

impl Entry {
    /// Read the current metadata of `path` into a `Created` entry.
    ///
    /// Never fails: an unreadable path yields no mtime, zero size and
    /// [`EntryKind::Unknown`], and the next poll sees it as removed.
    pub fn observe(path: &Path) -> Self {
        let (last_mod_time, size, kind) = match fs::metadata(path) {
            Ok(meta) => {
                let kind = EntryKind::from(meta.file_type());
                let size = if kind == EntryKind::Directory { 0 } else { meta.len() };
                (meta.modified().ok(), size, kind)
            }
            Err(err) => {
                tracing::debug!("stat failed for {}: {}", path.display(), err);
                (None, 0, EntryKind::Unknown)
            }
        };

        Self {
            path: path.to_path_buf(),
            last_path: path.to_path_buf(),
            status: EntryStatus::Created,
            last_mod_time,
            size,
            kind,
        }
    }

    /// Whether this entry's metadata differs from `other`'s
    pub fn differs_from(&self, other: &Entry) -> bool {
        self.last_mod_time != other.last_mod_time
            || self.size != other.size
            || self.kind != other.kind
    }

    /// Rename heuristic: same known mtime and same size as the vanished entry
    pub fn is_rename_of(&self, vanished: &Entry) -> bool {
        self.last_mod_time.is_some()
            && self.last_mod_time == vanished.last_mod_time
            && self.size == vanished.size
    }
}
