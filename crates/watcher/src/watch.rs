//! A single registered watch

use crate::matcher::{Matcher, PathPattern};
use crate::snapshot::Snapshot;
use pollwatch_core::Entry;
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// Change callback: `(batch, is_initial_call)`
pub type Callback = Box<dyn FnMut(&[Entry], bool) + Send + 'static>;

/// A (pattern, recursive, callback) registration with its snapshot
pub struct Watch {
    pattern: PathPattern,
    recursive: bool,
    callback: Callback,
    snapshot: Snapshot,
}

impl Watch {
    /// Take the initial snapshot of `pattern`.
    ///
    /// With `initial_list`, a non-empty initial snapshot is delivered to the
    /// callback right away as `(entries, true)`.
    pub fn new(
        pattern: PathPattern,
        recursive: bool,
        initial_list: bool,
        callback: Callback,
        matcher: &Matcher,
    ) -> Self {
        let mut watch = Self {
            pattern,
            recursive,
            callback,
            snapshot: Snapshot::new(),
        };

        let mut entries = Vec::new();
        for path in watch.observe(matcher) {
            watch.snapshot.poll_entry(&path, &mut entries);
        }

        if initial_list && !entries.is_empty() {
            watch.notify(&entries, true);
        }

        watch
    }

    /// Run one poll cycle and deliver the resulting batch, if any
    pub fn poll(&mut self, matcher: &Matcher) {
        let batch = self.diff(matcher);
        if !batch.is_empty() {
            self.notify(&batch, false);
        }
    }

    /// Re-observe the pattern and diff it against the snapshot
    fn diff(&mut self, matcher: &Matcher) -> Vec<Entry> {
        let observed = self.observe(matcher);
        let mut batch = Vec::new();

        let mut seen = HashSet::with_capacity(observed.len());
        for path in &observed {
            self.snapshot.poll_entry(path, &mut batch);
            seen.insert(path.to_string_lossy().into_owned());
        }
        self.snapshot.reconcile_removals(&seen, &mut batch);

        trace!(
            "polled {}: {} observed, {} changed",
            self.pattern.base.display(),
            observed.len(),
            batch.len()
        );
        batch
    }

    /// Paths currently covered by this watch
    fn observe(&self, matcher: &Matcher) -> Vec<PathBuf> {
        if self.pattern.has_filter() {
            let mut paths = Vec::new();
            matcher.expand(&self.pattern, self.recursive, false, |p| {
                paths.push(p.to_path_buf());
                ControlFlow::Continue(())
            });
            paths
        } else if self.pattern.base.symlink_metadata().is_ok() {
            vec![self.pattern.base.clone()]
        } else {
            Vec::new()
        }
    }

    fn notify(&mut self, batch: &[Entry], initial: bool) {
        let callback = &mut self.callback;
        if panic::catch_unwind(AssertUnwindSafe(|| callback(batch, initial))).is_err() {
            warn!("watch callback for {} panicked", self.pattern.base.display());
        }
    }

    pub fn root(&self) -> &Path {
        &self.pattern.base
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl std::fmt::Debug for Watch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watch")
            .field("pattern", &self.pattern)
            .field("recursive", &self.recursive)
            .field("entries", &self.snapshot.len())
            .finish()
    }
}
