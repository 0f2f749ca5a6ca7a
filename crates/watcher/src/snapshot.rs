//! Per-watch entry snapshot and diffing

use pollwatch_core::{Entry, EntryStatus};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Last observed entry per path, owned by a single watch
#[derive(Debug, Default)]
pub struct Snapshot {
    entries: BTreeMap<String, Entry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff the current state of `path` against the stored entry.
    ///
    /// New paths are stored and pushed as `Created`; changed mtime, size or
    /// kind is stored and pushed as `Modified`; unchanged paths are marked
    /// `Unmodified` and not pushed.
    pub fn poll_entry(&mut self, path: &Path, batch: &mut Vec<Entry>) {
        let observed = Entry::observe(path);
        let key = path.to_string_lossy().into_owned();

        match self.entries.get_mut(&key) {
            Some(stored) => {
                if observed.differs_from(stored) {
                    stored.last_mod_time = observed.last_mod_time;
                    stored.size = observed.size;
                    stored.kind = observed.kind;
                    stored.status = EntryStatus::Modified;
                    batch.push(stored.clone());
                } else {
                    stored.status = EntryStatus::Unmodified;
                }
            }
            None => {
                batch.push(observed.clone());
                self.entries.insert(key, observed);
            }
        }
    }

    /// Drop every stored path missing from `observed`.
    ///
    /// A vanished path whose mtime and size equal those of a `Created`
    /// entry in `batch` turns that entry into a `Renamed` one pointing back
    /// at the vanished path; otherwise a `Removed` entry is pushed.
    pub fn reconcile_removals(&mut self, observed: &HashSet<String>, batch: &mut Vec<Entry>) {
        let vanished: Vec<String> = self
            .entries
            .keys()
            .filter(|key| !observed.contains(*key))
            .cloned()
            .collect();

        for key in vanished {
            let Some(mut gone) = self.entries.remove(&key) else { continue };

            let successor = batch
                .iter_mut()
                .find(|e| e.status == EntryStatus::Created && e.is_rename_of(&gone));

            match successor {
                Some(renamed) => {
                    renamed.status = EntryStatus::Renamed;
                    renamed.last_path = gone.path;
                }
                None => {
                    gone.status = EntryStatus::Removed;
                    batch.push(gone);
                }
            }
        }
    }

    pub fn get(&self, path: &Path) -> Option<&Entry> {
        self.entries.get(&*path.to_string_lossy())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
