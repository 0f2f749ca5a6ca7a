//! Registry of active watches
//!
//! Watches are keyed by the path string they were registered with, so two
//! wildcard registrations under the same directory coexist. The registry
//! lives behind a re-entrant lock shared with the poller: callbacks run
//! while the lock is held and may call back into the engine.
//!
//! While a watch is being polled it is moved out of the map and tracked as
//! in flight, so callbacks never observe the map mutably borrowed.

use crate::poller::Poller;
use crate::watch::Watch;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::thread::JoinHandle;

/// Re-entrant lock guarding the registry and poller lifecycle
pub(crate) type RegistryLock = ReentrantMutex<RefCell<Registry>>;

/// A watch currently taken out of the map for polling
#[derive(Debug)]
struct InFlight {
    key: String,
    /// Unregistered while in flight; dropped once the poll returns
    detached: bool,
}

#[derive(Default)]
pub(crate) struct Registry {
    watches: BTreeMap<String, Watch>,
    in_flight: Vec<InFlight>,
    poller: Option<Poller>,
    /// Stopped pollers not yet joined
    retired: Vec<JoinHandle<()>>,
}

impl Registry {
    /// Whether `key` is registered (including a watch currently polling)
    pub fn contains(&self, key: &str) -> bool {
        self.watches.contains_key(key)
            || self.in_flight.iter().any(|f| f.key == key && !f.detached)
    }

    /// Insert unless `key` is already registered
    pub fn insert(&mut self, key: String, watch: Watch) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.watches.insert(key, watch);
        true
    }

    /// Registered keys in iteration order
    pub fn keys(&self) -> Vec<String> {
        self.watches.keys().cloned().collect()
    }

    /// Move a watch out of the map for polling
    pub fn take_for_poll(&mut self, key: &str) -> Option<Watch> {
        let watch = self.watches.remove(key)?;
        self.in_flight.push(InFlight {
            key: key.to_string(),
            detached: false,
        });
        Some(watch)
    }

    /// Put a polled watch back, unless it was unregistered meanwhile.
    ///
    /// A watch that is not put back is returned so the caller can drop it
    /// once the registry is no longer borrowed.
    pub fn restore_after_poll(&mut self, key: String, watch: Watch) -> Option<Watch> {
        let detached = match self.in_flight.iter().rposition(|f| f.key == key) {
            Some(idx) => self.in_flight.remove(idx).detached,
            None => true,
        };
        if detached || self.watches.contains_key(&key) {
            return Some(watch);
        }
        self.watches.insert(key, watch);
        None
    }

    /// Remove the watch registered under `key`.
    ///
    /// A watch that is in flight is detached instead and `None` is returned.
    pub fn remove(&mut self, key: &str) -> Option<Watch> {
        if let Some(watch) = self.watches.remove(key) {
            return Some(watch);
        }
        for flight in self.in_flight.iter_mut().filter(|f| f.key == key) {
            flight.detached = true;
        }
        None
    }

    /// Remove every watch whose key's parent directory is `dir`
    pub fn remove_siblings(&mut self, dir: &Path) -> Vec<(String, Watch)> {
        let keys: Vec<String> = self
            .watches
            .keys()
            .filter(|key| parent_of(key) == dir)
            .cloned()
            .collect();

        for flight in self.in_flight.iter_mut().filter(|f| parent_of(&f.key) == dir) {
            flight.detached = true;
        }

        keys.into_iter()
            .filter_map(|key| self.watches.remove(&key).map(|watch| (key, watch)))
            .collect()
    }

    /// Unregister every watch, handing them back to the caller
    pub fn clear(&mut self) -> Vec<Watch> {
        for flight in &mut self.in_flight {
            flight.detached = true;
        }
        std::mem::take(&mut self.watches).into_values().collect()
    }

    /// Number of registered watches
    pub fn len(&self) -> usize {
        self.watches.len() + self.in_flight.iter().filter(|f| !f.detached).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn poller_running(&self) -> bool {
        self.poller.is_some()
    }

    pub fn set_poller(&mut self, poller: Poller) {
        self.retire_poller();
        self.poller = Some(poller);
    }

    /// Signal the running poller to stop and keep its thread for joining
    pub fn retire_poller(&mut self) {
        self.retired.retain(|thread| !thread.is_finished());
        if let Some(poller) = self.poller.take() {
            self.retired.push(poller.stop());
        }
    }

    /// Hand out every retired poller thread
    pub fn drain_threads(&mut self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut self.retired)
    }
}

fn parent_of(key: &str) -> &Path {
    Path::new(key).parent().unwrap_or_else(|| Path::new(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{Matcher, PathPattern};
    use pollwatch_core::Entry;
    use tempfile::TempDir;

    fn watch_on(path: &Path) -> Watch {
        Watch::new(
            PathPattern::resolve(path),
            false,
            false,
            Box::new(|_: &[Entry], _: bool| {}),
            &Matcher::default(),
        )
    }

    #[test]
    fn test_insert_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = Registry::default();

        assert!(registry.insert("/d/a".into(), watch_on(temp_dir.path())));
        assert!(!registry.insert("/d/a".into(), watch_on(temp_dir.path())));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_siblings_is_scoped_to_parent() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = Registry::default();
        for key in ["/d/a", "/d/*.txt", "/d/sub/b", "/e/c"] {
            registry.insert(key.into(), watch_on(temp_dir.path()));
        }

        let removed: Vec<String> = registry
            .remove_siblings(Path::new("/d"))
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        assert_eq!(removed, vec!["/d/*.txt".to_string(), "/d/a".to_string()]);
        assert_eq!(registry.keys(), vec!["/d/sub/b".to_string(), "/e/c".to_string()]);
    }

    #[test]
    fn test_in_flight_watch_counts_as_registered() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = Registry::default();
        registry.insert("/d/a".into(), watch_on(temp_dir.path()));

        let watch = registry.take_for_poll("/d/a").unwrap();
        assert!(registry.contains("/d/a"));
        assert!(!registry.insert("/d/a".into(), watch_on(temp_dir.path())));
        assert_eq!(registry.len(), 1);

        assert!(registry.restore_after_poll("/d/a".into(), watch).is_none());
        assert_eq!(registry.keys(), vec!["/d/a".to_string()]);
    }

    #[test]
    fn test_removed_while_in_flight_is_not_restored() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = Registry::default();
        registry.insert("/d/a".into(), watch_on(temp_dir.path()));

        let watch = registry.take_for_poll("/d/a").unwrap();
        assert!(registry.remove("/d/a").is_none());
        assert!(registry.is_empty());

        assert!(registry.restore_after_poll("/d/a".into(), watch).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear_detaches_in_flight() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = Registry::default();
        registry.insert("/d/a".into(), watch_on(temp_dir.path()));
        registry.insert("/d/b".into(), watch_on(temp_dir.path()));

        let watch = registry.take_for_poll("/d/a").unwrap();
        assert_eq!(registry.clear().len(), 1);

        assert!(registry.restore_after_poll("/d/a".into(), watch).is_some());
        assert!(registry.is_empty());
    }
}
