//! Background poll loop
//!
//! One thread per engine wakes every poll interval, takes the registry
//! lock and polls every registered watch in turn. It sleeps on a stop
//! channel so a shutdown wakes it immediately.

use crate::engine::Shared;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use pollwatch_core::{Result, WatchError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

const THREAD_NAME: &str = "pollwatch-poller";

/// Handle to a running poll loop
pub(crate) struct Poller {
    /// Dropping the sender disconnects the loop's receiver
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

impl Poller {
    /// Start the poll loop for `shared`
    pub fn spawn(shared: Arc<Shared>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = bounded(1);

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(shared, stop_rx, interval))
            .map_err(WatchError::Spawn)?;

        debug!("started poller (interval: {:?})", interval);
        Ok(Self { stop_tx, thread })
    }

    /// Signal the loop to exit; returns the thread for joining
    pub fn stop(self) -> JoinHandle<()> {
        drop(self.stop_tx);
        self.thread
    }
}

/// Whether a stop was signalled on `stop_rx`
pub(crate) fn stop_requested(stop_rx: &Receiver<()>) -> bool {
    !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
}

fn run(shared: Arc<Shared>, stop_rx: Receiver<()>, interval: Duration) {
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        if !shared.tick(Some(&stop_rx)) {
            break;
        }
    }

    debug!("poller stopped");
}
