//! The watch engine
//!
//! [`Watcher`] owns a registry of watches and the background poller that
//! drives them. Engines are independent of each other; dropping one shuts
//! its poller down.

use crate::ignore::ExcludeRules;
use crate::matcher::{Matcher, PathPattern};
use crate::poller::{stop_requested, Poller};
use crate::registry::{Registry, RegistryLock};
use crate::touch;
use crate::watch::Watch;
use crossbeam_channel::Receiver;
use parking_lot::ReentrantMutex;
use pollwatch_core::{Entry, Result, WatcherConfig};
use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{debug, trace};

/// Outcome of [`Watcher::watch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new watch was registered
    Added,
    /// The path was already registered; the new callback was dropped
    AlreadyWatched,
    /// The path has no wildcard and does not exist; nothing was registered
    NotFound,
}

/// State shared between the engine handle and its poller thread
pub(crate) struct Shared {
    registry: RegistryLock,
    matcher: Matcher,
    poll_interval: Duration,
}

impl Shared {
    /// Poll every registered watch once, in key order.
    ///
    /// Returns `false` without polling if `stop_rx` carries a stop signal;
    /// the check happens under the registry lock so no tick starts after a
    /// shutdown has released it.
    pub(crate) fn tick(&self, stop_rx: Option<&Receiver<()>>) -> bool {
        let guard = self.registry.lock();
        if stop_rx.is_some_and(stop_requested) {
            return false;
        }

        let keys = guard.borrow().keys();
        trace!("poll tick over {} watches", keys.len());

        for key in keys {
            let taken = guard.borrow_mut().take_for_poll(&key);
            if let Some(mut watch) = taken {
                watch.poll(&self.matcher);
                let unregistered = guard.borrow_mut().restore_after_poll(key, watch);
                drop(unregistered);
            }
        }

        retire_if_idle(&guard);
        true
    }
}

/// Stop the poller once nothing is registered
fn retire_if_idle(registry: &RefCell<Registry>) {
    let mut registry = registry.borrow_mut();
    if registry.is_empty() && registry.poller_running() {
        debug!("registry empty, stopping poller");
        registry.retire_poller();
    }
}

/// Polling filesystem watcher
///
/// ```no_run
/// use pollwatch::Watcher;
///
/// let watcher = Watcher::new();
/// watcher.watch("/var/log/*.log", false, true, |batch, initial| {
///     for entry in batch {
///         println!("{:?} {} (initial: {})", entry.status, entry.path.display(), initial);
///     }
/// })?;
/// # Ok::<(), pollwatch::WatchError>(())
/// ```
pub struct Watcher {
    shared: Arc<Shared>,
}

impl Watcher {
    /// Engine with the default configuration
    pub fn new() -> Self {
        Self::from_parts(Matcher::default(), WatcherConfig::default().poll_interval())
    }

    /// Engine with a validated configuration
    pub fn with_config(config: WatcherConfig) -> Result<Self> {
        config.validate()?;
        let exclude = ExcludeRules::new(&config.exclude)?;
        let matcher = Matcher::new(config.match_mode, exclude);
        Ok(Self::from_parts(matcher, config.poll_interval()))
    }

    fn from_parts(matcher: Matcher, poll_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: ReentrantMutex::new(RefCell::new(Registry::default())),
                matcher,
                poll_interval,
            }),
        }
    }

    /// Watch `path` and deliver change batches to `callback`.
    ///
    /// `path` may carry one `*` in its final component; `recursive` then
    /// expands the pattern in subdirectories too. With `initial_list` the
    /// entries present at registration are delivered at once as
    /// `(entries, true)`. Registering an already watched path is a no-op.
    ///
    /// Starts the poller if needed; failing to start it is the only error.
    pub fn watch<P, F>(
        &self,
        path: P,
        recursive: bool,
        initial_list: bool,
        callback: F,
    ) -> Result<Registration>
    where
        P: AsRef<Path>,
        F: FnMut(&[Entry], bool) + Send + 'static,
    {
        let path = path.as_ref();
        let key = path.to_string_lossy().into_owned();
        let pattern = PathPattern::resolve(path);
        if !pattern.has_filter() && !path.exists() {
            return Ok(Registration::NotFound);
        }

        let guard = self.shared.registry.lock();
        if guard.borrow().contains(&key) {
            debug!("already watching {}", key);
            return Ok(Registration::AlreadyWatched);
        }

        let watch = Watch::new(
            pattern,
            recursive,
            initial_list,
            Box::new(callback),
            &self.shared.matcher,
        );
        if !guard.borrow_mut().insert(key.clone(), watch) {
            return Ok(Registration::AlreadyWatched);
        }

        if !guard.borrow().poller_running() {
            match Poller::spawn(Arc::clone(&self.shared), self.shared.poll_interval) {
                Ok(poller) => guard.borrow_mut().set_poller(poller),
                Err(e) => {
                    let unregistered = guard.borrow_mut().remove(&key);
                    drop(unregistered);
                    return Err(e);
                }
            }
        }

        debug!("watching {}", key);
        Ok(Registration::Added)
    }

    /// Stop watching `path`.
    ///
    /// With `recursive`, every watch whose registration path shares
    /// `path`'s parent directory is removed. Each removed watch is polled
    /// one last time first. An empty path removes everything (see
    /// [`unwatch_all`](Self::unwatch_all)).
    pub fn unwatch<P: AsRef<Path>>(&self, path: P, recursive: bool) {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            self.unwatch_all();
            return;
        }

        let guard = self.shared.registry.lock();
        let removed: Vec<Watch> = if recursive {
            let dir = path.parent().unwrap_or_else(|| Path::new(""));
            let removed = guard.borrow_mut().remove_siblings(dir);
            removed.into_iter().map(|(_, watch)| watch).collect()
        } else {
            let key = path.to_string_lossy();
            let removed = guard.borrow_mut().remove(&key);
            removed.into_iter().collect()
        };

        for mut watch in removed {
            debug!("unwatching {}", watch.root().display());
            watch.poll(&self.shared.matcher);
        }

        retire_if_idle(&guard);
    }

    /// Remove every watch without a final poll
    pub fn unwatch_all(&self) {
        let guard = self.shared.registry.lock();
        let removed = guard.borrow_mut().clear();
        debug!("unwatched {} paths", removed.len());
        retire_if_idle(&guard);
        drop(removed);
    }

    /// Set the modification time of `path` (or of every wildcard match) to now
    pub fn touch<P: AsRef<Path>>(&self, path: P, recursive: bool) -> usize {
        self.touch_at(path, recursive, SystemTime::now())
    }

    /// Set the modification time of `path` (or of every wildcard match)
    pub fn touch_at<P: AsRef<Path>>(&self, path: P, recursive: bool, time: SystemTime) -> usize {
        touch::touch(&self.shared.matcher, path.as_ref(), recursive, time)
    }

    /// Run one poll tick on the calling thread
    pub fn poll_now(&self) {
        self.shared.tick(None);
    }

    /// Whether `path` is registered
    pub fn is_watching<P: AsRef<Path>>(&self, path: P) -> bool {
        let key = path.as_ref().to_string_lossy();
        self.shared.registry.lock().borrow().contains(&key)
    }

    /// Number of registered watches
    pub fn len(&self) -> usize {
        self.shared.registry.lock().borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the background poller is running
    pub fn is_running(&self) -> bool {
        self.shared.registry.lock().borrow().poller_running()
    }

    pub fn poll_interval(&self) -> Duration {
        self.shared.poll_interval
    }

    /// Remove every watch and wait for the poller to exit.
    ///
    /// No callback runs after this returns, except when called from
    /// inside a callback, where the poller cannot be joined.
    pub fn shutdown(&self) {
        let (removed, threads) = {
            let guard = self.shared.registry.lock();
            let mut registry = guard.borrow_mut();
            let removed = registry.clear();
            registry.retire_poller();
            (removed, registry.drain_threads())
        };
        drop(removed);

        let current = thread::current().id();
        for handle in threads {
            if handle.thread().id() != current {
                let _ = handle.join();
            }
        }
    }
}

impl Default for Watcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("watches", &self.len())
            .field("running", &self.is_running())
            .field("poll_interval", &self.shared.poll_interval)
            .finish()
    }
}
