//! Merge Scheduler
//!
//! Background thread that runs a merge every `interval` until stopped.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Sender};
use crossbeam::select;

use crate::db::Store;
use crate::error::{CaskError, Result};

/// Handle to the merge timer thread
pub(crate) struct MergeScheduler {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl MergeScheduler {
    /// Spawn the timer thread
    pub(crate) fn start(store: Arc<Store>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("caskkv-merge".to_string())
            .spawn(move || {
                tracing::debug!("Merge timer started, interval {:?}", interval);
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        default(interval) => {
                            tracing::debug!("Merge timer fired");
                            match super::run(&store) {
                                Ok(()) => {}
                                Err(CaskError::MergeAlreadyRunning) => {
                                    tracing::debug!("Merge already running, skipping tick");
                                }
                                Err(CaskError::ClosedDatabaseUsed) => break,
                                Err(e) => tracing::warn!("Background merge failed: {}", e),
                            }
                        }
                    }
                }
                tracing::debug!("Merge timer stopped");
            })?;

        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Stop the timer and wait for the thread to exit
    ///
    /// A merge already running finishes (or observes its cancel token) first.
    pub(crate) fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // A full channel means a stop is already pending
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Merge timer thread panicked");
            }
        }
    }
}

impl Drop for MergeScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
