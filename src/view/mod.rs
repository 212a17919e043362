//! View state derived from fetch outcomes.
//!
//! A [`ViewModel`] folds a stream of [`FetchOutcome`]s into the latest
//! displayable state. The folding rule favors availability: once a fetch has
//! succeeded, later failures mark the view [`Status::Stale`] but keep showing
//! the last good data instead of blanking it. Only a view that has never
//! loaded anything shows [`Status::Error`].
//!
//! Renderers either pull a [`Snapshot`] on their own schedule or register a
//! listener with [`ViewModel::subscribe`] to be called after every update.
//! [`bind`] wires a view model to the poller so each view owns exactly one
//! poller/view-model pair.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::fetch::{ErrorKind, FetchOutcome};
use crate::poll::{self, PollHandle};

// ---------------------------------------------------------------------------
// Status and snapshot
// ---------------------------------------------------------------------------

/// Display status of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No fetch has completed yet.
    Loading,
    /// The most recent fetch succeeded.
    Ready,
    /// The most recent fetch failed, but earlier data is still on display.
    Stale,
    /// Every fetch so far has failed; there is nothing to display.
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Ready => write!(f, "ready"),
            Self::Stale => write!(f, "stale"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Point-in-time copy of a view's state. Produced by [`ViewModel::snapshot`];
/// reading one never mutates the view.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub status: Status,
    /// `None` exactly until the first successful fetch.
    pub data: Option<T>,
    /// Completion time of the last successful fetch.
    pub last_updated: Option<DateTime<Utc>>,
    /// Kind of the most recent failure, if the last fetch failed.
    pub last_error: Option<ErrorKind>,
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

type Listener<T> = Box<dyn FnMut(&Snapshot<T>) + Send>;

/// Latest-known display state for one view. Single writer (the poller's
/// delivery callback); any number of snapshot readers.
pub struct ViewModel<T> {
    status: Status,
    data: Option<T>,
    last_updated: Option<DateTime<Utc>>,
    last_error: Option<ErrorKind>,
    listeners: Vec<Listener<T>>,
}

impl<T: Clone> ViewModel<T> {
    /// Fresh view: `Loading`, no data, no error.
    pub fn new() -> Self {
        Self {
            status: Status::Loading,
            data: None,
            last_updated: None,
            last_error: None,
            listeners: Vec::new(),
        }
    }

    /// Fold one fetch outcome into the view state, then notify listeners.
    pub fn update(&mut self, outcome: FetchOutcome<T>) {
        match outcome {
            FetchOutcome::Success { data, at } => {
                self.status = Status::Ready;
                self.data = Some(data);
                self.last_updated = Some(at);
                self.last_error = None;
            }
            FetchOutcome::Failure { kind, .. } => {
                // Keep last-good data on display; only a view that never
                // loaded goes to Error.
                self.status = if self.data.is_some() {
                    Status::Stale
                } else {
                    Status::Error
                };
                self.last_error = Some(kind);
            }
        }
        self.notify();
    }

    /// Copy out the current state. Pure projection, no side effects.
    pub fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            status: self.status,
            data: self.data.clone(),
            last_updated: self.last_updated,
            last_error: self.last_error,
        }
    }

    /// Register a listener invoked synchronously after every [`update`](Self::update),
    /// with the fresh snapshot. Listeners are never unregistered; they live
    /// as long as the view model.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&Snapshot<T>) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = Snapshot {
            status: self.status,
            data: self.data.clone(),
            last_updated: self.last_updated,
            last_error: self.last_error,
        };
        for listener in &mut self.listeners {
            listener(&snapshot);
        }
    }
}

impl<T: Clone> Default for ViewModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Shared handle
// ---------------------------------------------------------------------------

/// Thread-safe handle to a [`ViewModel`], shared between the poller worker
/// (writer) and the render path (reader).
pub struct SharedViewModel<T> {
    inner: Arc<Mutex<ViewModel<T>>>,
}

impl<T: Clone> SharedViewModel<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ViewModel::new())),
        }
    }

    pub fn update(&self, outcome: FetchOutcome<T>) {
        self.lock().update(outcome);
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.lock().snapshot()
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: FnMut(&Snapshot<T>) + Send + 'static,
    {
        self.lock().subscribe(listener);
    }

    fn lock(&self) -> MutexGuard<'_, ViewModel<T>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> Default for SharedViewModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SharedViewModel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Wire a fetch function to a fresh view model via the poller. Returns the
/// shared view for the render path and the handle that owns the poll; drop
/// the handle and the view stops receiving writes.
pub fn bind<T, F>(fetch: F, interval: Duration) -> (SharedViewModel<T>, PollHandle)
where
    T: Clone + Send + 'static,
    F: FnMut() -> FetchOutcome<T> + Send + 'static,
{
    let view = SharedViewModel::new();
    let writer = view.clone();
    let handle = poll::start(fetch, interval, move |outcome| writer.update(outcome));
    (view, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ErrorKind;

    #[test]
    fn starts_loading_with_no_data() {
        let view: ViewModel<u32> = ViewModel::new();
        let snap = view.snapshot();
        assert_eq!(snap.status, Status::Loading);
        assert!(snap.data.is_none());
        assert!(snap.last_updated.is_none());
        assert!(snap.last_error.is_none());
    }

    #[test]
    fn success_sets_ready_and_clears_error() {
        let mut view = ViewModel::new();
        view.update(FetchOutcome::failure(ErrorKind::Network, "down"));
        view.update(FetchOutcome::success(5u32));

        let snap = view.snapshot();
        assert_eq!(snap.status, Status::Ready);
        assert_eq!(snap.data, Some(5));
        assert!(snap.last_updated.is_some());
        assert!(snap.last_error.is_none());
    }

    #[test]
    fn first_failure_is_error_with_no_data() {
        let mut view: ViewModel<u32> = ViewModel::new();
        view.update(FetchOutcome::failure(ErrorKind::Server(500), "boom"));

        let snap = view.snapshot();
        assert_eq!(snap.status, Status::Error);
        assert!(snap.data.is_none());
        assert_eq!(snap.last_error, Some(ErrorKind::Server(500)));
    }

    #[test]
    fn failure_after_success_goes_stale_and_keeps_data() {
        let mut view = ViewModel::new();
        view.update(FetchOutcome::success(100u32));
        let updated_at = view.snapshot().last_updated;

        view.update(FetchOutcome::failure(ErrorKind::Network, "timeout"));

        let snap = view.snapshot();
        assert_eq!(snap.status, Status::Stale);
        assert_eq!(snap.data, Some(100), "stale view keeps last good data");
        assert_eq!(snap.last_error, Some(ErrorKind::Network));
        assert_eq!(snap.last_updated, updated_at, "failures do not advance last_updated");
    }

    #[test]
    fn data_is_none_iff_never_succeeded() {
        let mut view: ViewModel<u32> = ViewModel::new();
        for _ in 0..5 {
            view.update(FetchOutcome::failure(ErrorKind::Parse, "bad"));
            assert!(view.snapshot().data.is_none());
        }
        view.update(FetchOutcome::success(1));
        view.update(FetchOutcome::failure(ErrorKind::Parse, "bad"));
        assert!(view.snapshot().data.is_some());
    }

    #[test]
    fn listeners_see_every_update() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);

        let mut view = ViewModel::new();
        view.subscribe(move |snap: &Snapshot<u32>| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert_ne!(snap.status, Status::Loading, "listeners run post-update");
        });

        view.update(FetchOutcome::success(1u32));
        view.update(FetchOutcome::failure(ErrorKind::Network, "down"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn shared_view_clones_observe_same_state() {
        let shared: SharedViewModel<u32> = SharedViewModel::new();
        let writer = shared.clone();
        writer.update(FetchOutcome::success(9));
        assert_eq!(shared.snapshot().data, Some(9));
    }
}
