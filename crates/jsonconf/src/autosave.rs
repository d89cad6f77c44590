//! Background auto-save worker.
//!
//! The worker is a dedicated named thread that behaves like a single-shot
//! timer re-armed after every tick:
//!
//! ```text
//! spawn ──wait(interval)──▶ tick() ──wait(interval)──▶ tick() ── ... ──▶ stop
//! ```
//!
//! Because the next wait only starts once `tick()` has returned, ticks never
//! overlap, however long a save takes.  The tick closure owns its error
//! handling; the worker re-arms whatever the tick did.
//!
//! # Stopping
//!
//! The wait is a `recv_timeout` on a channel whose sender the [`AutoSaver`]
//! keeps.  Dropping the sender wakes the worker immediately with
//! `Disconnected`, so [`AutoSaver::stop`] never has to wait out a full
//! interval.  A tick that is already running is allowed to finish: `stop`
//! joins the thread, so when it returns no tick is in flight and none will
//! start again.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, error};

/// Thread name given to every auto-save worker.
pub const WORKER_THREAD_NAME: &str = "jsonconf-autosave";

/// Handle on a running auto-save worker.
#[derive(Debug)]
pub struct AutoSaver {
    interval: Duration,
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AutoSaver {
    /// Starts a worker that calls `tick` once per `interval`, re-arming after
    /// each call.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn<F>(interval: Duration, mut tick: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                debug!(?interval, "auto-save worker started");
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => tick(),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("auto-save worker stopped");
            })?;

        Ok(Self {
            interval,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops re-arming and waits for any in-flight tick to finish.
    ///
    /// Safe to call more than once.
    pub fn stop(&mut self) {
        // Closing the channel wakes the worker out of its wait.
        drop(self.stop_tx.take());

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("auto-save worker panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
