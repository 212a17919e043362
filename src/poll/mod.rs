//! Fixed-interval poller with single-flight discipline.
//!
//! [`start`] spawns one worker thread that performs an immediate fetch and
//! then re-fetches on a fixed wall-clock grid anchored at the poll epoch.
//! Because the (blocking) fetch runs on the worker itself, at most one fetch
//! is ever in flight per poller; any grid deadline that passes while a fetch
//! is still running is skipped outright rather than queued, so a slow backend
//! never causes a burst of catch-up requests.
//!
//! Every completed fetch — success or failure — is delivered to the
//! caller's callback exactly once, in completion order. Failures never stop
//! the poller; it keeps retrying at the same cadence until cancelled.
//!
//! Cancellation goes through [`PollHandle`]: deliveries and the cancel flag
//! share one mutex, so once `cancel()` returns no further delivery can start
//! (a fetch already in flight finishes in the background and its outcome is
//! discarded). Dropping the handle cancels it, which keeps the timer
//! resource scoped to the view that owns it.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::fetch::FetchOutcome;

/// Start polling. `fetch` runs on a dedicated worker thread every `interval`,
/// and each outcome is handed to `on_result` on that same thread.
///
/// `interval` is clamped to at least 1 ms so a zero interval cannot spin.
pub fn start<T, F, C>(mut fetch: F, interval: Duration, mut on_result: C) -> PollHandle
where
    T: 'static,
    F: FnMut() -> FetchOutcome<T> + Send + 'static,
    C: FnMut(FetchOutcome<T>) + Send + 'static,
{
    let interval = interval.max(Duration::from_millis(1));
    let cancelled = Arc::new(Mutex::new(false));
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let gate = Arc::clone(&cancelled);
    let worker = thread::spawn(move || {
        let epoch = Instant::now();
        // First deadline is the epoch itself: fetch immediately on start.
        let mut deadline = epoch;

        loop {
            // Sleep until the deadline, waking early if cancelled.
            loop {
                if *lock(&gate) {
                    return;
                }
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                match stop_rx.recv_timeout(deadline - now) {
                    Err(RecvTimeoutError::Timeout) => {}
                    // Stop signal, or the handle is gone entirely.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }
            }

            let outcome = fetch();

            // Deliver under the gate: after cancel() returns, no delivery
            // can start, and an in-flight outcome is dropped here.
            let guard = lock(&gate);
            if *guard {
                return;
            }
            on_result(outcome);
            drop(guard);

            // Next deadline is the first grid point strictly after the fetch
            // completed. Grid points the fetch ran past are the skipped ticks.
            let grid_steps = epoch.elapsed().as_nanos() / interval.as_nanos() + 1;
            let grid_steps = u32::try_from(grid_steps).unwrap_or(u32::MAX);
            deadline = epoch + interval * grid_steps;
        }
    });

    PollHandle {
        cancelled,
        stop_tx,
        worker: Some(worker),
    }
}

/// Handle owning an active poll. Cancel explicitly with [`cancel`](Self::cancel)
/// or implicitly by dropping the handle.
pub struct PollHandle {
    cancelled: Arc<Mutex<bool>>,
    stop_tx: mpsc::Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stop the poll. Idempotent: the first call guarantees no further
    /// deliveries; later calls are no-ops. Does not wait for an in-flight
    /// fetch — its outcome is silently discarded when it completes.
    pub fn cancel(&mut self) {
        let mut cancelled = lock(&self.cancelled);
        if *cancelled {
            return;
        }
        *cancelled = true;
        drop(cancelled);
        // Wake the worker if it is sleeping between ticks. If it already
        // exited the channel is closed, which is fine.
        let _ = self.stop_tx.send(());
    }

    /// Whether this poll has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *lock(&self.cancelled)
    }

    /// Cancel and wait for the worker thread to exit, releasing the fetch
    /// closure and everything it captures. Blocks for at most the duration
    /// of one in-flight fetch.
    pub fn stop(mut self) {
        self.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Lock that shrugs off poisoning: a panic in a delivery callback must not
/// wedge cancellation.
fn lock(m: &Mutex<bool>) -> MutexGuard<'_, bool> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
