//! Wildcard path resolution and expansion
//!
//! A watch path may carry a single `*` in its final component. Such a path
//! is split into a base directory and a filename filter; expanding the
//! pattern visits every child of the base (optionally recursing) whose
//! full path matches the filter.

use crate::ignore::ExcludeRules;
use pollwatch_core::MatchMode;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Wildcard marker
pub const WILDCARD: char = '*';

/// Whether `path` contains the wildcard marker
pub fn has_wildcard(path: &Path) -> bool {
    path.to_string_lossy().contains(WILDCARD)
}

/// A watch path split into base directory and filename filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    /// Directory the filter applies to, or the watched path itself
    pub base: PathBuf,
    /// Filename filter with one wildcard; empty means "`base` itself"
    pub filter: String,
}

impl PathPattern {
    /// Split `path` into `(base, filter)`.
    ///
    /// Without a wildcard the path is returned unchanged with an empty
    /// filter; a missing target is logged and still resolves.
    pub fn resolve(path: &Path) -> Self {
        if has_wildcard(path) {
            if let Some(name) = path.file_name() {
                let filter = name.to_string_lossy().into_owned();
                if filter.contains(WILDCARD) {
                    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
                    return Self { base, filter };
                }
            }
            warn!(
                "wildcard outside the final path component is not supported: {}",
                path.display()
            );
        } else if !path.exists() {
            warn!("path not found: {}", path.display());
        }

        Self {
            base: path.to_path_buf(),
            filter: String::new(),
        }
    }

    /// Whether this pattern carries a wildcard filter
    pub fn has_filter(&self) -> bool {
        !self.filter.is_empty()
    }

    /// Text around the first wildcard of the filter, each half prefixed by `dir`
    fn halves(&self, dir: &Path) -> (String, String) {
        let full = dir.join(&self.filter).to_string_lossy().into_owned();
        match full.split_once(WILDCARD) {
            Some((before, after)) => (before.to_string(), after.to_string()),
            None => (full, String::new()),
        }
    }
}

/// Matches candidate paths against a filter's halves
fn matches(mode: MatchMode, candidate: &str, before: &str, after: &str) -> bool {
    match mode {
        MatchMode::Substring => {
            (before.is_empty() || candidate.contains(before))
                && (after.is_empty() || candidate.contains(after))
        }
        MatchMode::Glob => {
            candidate.len() >= before.len() + after.len()
                && candidate.starts_with(before)
                && candidate.ends_with(after)
                && !candidate[before.len()..candidate.len() - after.len()].contains(MAIN_SEPARATOR)
        }
    }
}

/// Expands [`PathPattern`]s against the live filesystem
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    mode: MatchMode,
    exclude: ExcludeRules,
}

impl Matcher {
    pub fn new(mode: MatchMode, exclude: ExcludeRules) -> Self {
        Self { mode, exclude }
    }

    /// Visit every path matched by `pattern`.
    ///
    /// With an empty filter only `pattern.base` is visited. With
    /// `visit_empty`, an empty directory that the expansion descends into
    /// is visited itself in place of its (absent) children. The visitor
    /// returns [`ControlFlow::Break`] to stop the walk early.
    pub fn expand<F>(&self, pattern: &PathPattern, recursive: bool, visit_empty: bool, mut visitor: F)
    where
        F: FnMut(&Path) -> ControlFlow<()>,
    {
        if !pattern.has_filter() {
            let _ = visitor(&pattern.base);
            return;
        }

        if visit_empty && is_empty_dir(&pattern.base) {
            let _ = visitor(&pattern.base);
            return;
        }

        if !pattern.base.is_dir() {
            debug!("wildcard base is not a directory: {}", pattern.base.display());
            return;
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(&pattern.base)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(&pattern.base, e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Vanished mid-walk, unreadable, or a symlink loop
                    debug!("skipping unreadable entry under {}: {}", pattern.base.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if recursive && visit_empty && entry.file_type().is_dir() && is_empty_dir(path) {
                if visitor(path).is_break() {
                    return;
                }
                continue;
            }

            let Some(parent) = path.parent() else { continue };
            let (before, after) = pattern.halves(parent);
            let candidate = path.to_string_lossy();
            if matches(self.mode, &candidate, &before, &after) && visitor(path).is_break() {
                return;
            }
        }
    }

    /// Collect every path matched by `pattern`
    pub fn collect(&self, pattern: &PathPattern, recursive: bool) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        self.expand(pattern, recursive, false, |p| {
            paths.push(p.to_path_buf());
            ControlFlow::Continue(())
        });
        paths
    }

    /// Whether `pattern` currently matches anything
    pub fn any_match(&self, pattern: &PathPattern, recursive: bool) -> bool {
        let mut found = false;
        self.expand(pattern, recursive, false, |_| {
            found = true;
            ControlFlow::Break(())
        });
        found
    }

    fn is_excluded(&self, base: &Path, entry: &walkdir::DirEntry) -> bool {
        match entry.path().strip_prefix(base) {
            Ok(relative) => self.exclude.is_excluded(relative, entry.file_type().is_dir()),
            Err(_) => false,
        }
    }
}

fn is_empty_dir(path: &Path) -> bool {
    match std::fs::read_dir(path) {
        Ok(mut children) => children.next().is_none(),
        Err(_) => false,
    }
}
