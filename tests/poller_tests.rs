//! Integration tests for the fixed-interval poller.
//!
//! These exercise the timing and cancellation contract end to end with real
//! threads: single-flight fetching, tick skipping under slow fetches,
//! idempotent cancellation, and the no-deliveries-after-cancel guarantee.
//! Intervals are kept in the tens of milliseconds with generous assertion
//! margins so the tests stay robust on loaded CI machines.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use emon::fetch::{ErrorKind, FetchOutcome};
use emon::poll;

/// Shared delivery log: the value carried by each outcome, in order.
type Deliveries = Arc<Mutex<Vec<u64>>>;

fn deliveries() -> Deliveries {
    Arc::new(Mutex::new(Vec::new()))
}

fn record(log: &Deliveries) -> impl FnMut(FetchOutcome<u64>) + Send + 'static {
    let log = Arc::clone(log);
    move |outcome| {
        let value = match outcome {
            FetchOutcome::Success { data, .. } => data,
            FetchOutcome::Failure { .. } => u64::MAX,
        };
        log.lock().unwrap().push(value);
    }
}

#[test]
fn first_fetch_is_immediate_and_cadence_holds() {
    let log = deliveries();
    let counter = Arc::new(AtomicUsize::new(0));
    let fetch_counter = Arc::clone(&counter);

    let mut handle = poll::start(
        move || FetchOutcome::success(fetch_counter.fetch_add(1, Ordering::SeqCst) as u64),
        Duration::from_millis(50),
        record(&log),
    );

    // The first delivery lands well before the first interval elapses.
    thread::sleep(Duration::from_millis(25));
    assert_eq!(log.lock().unwrap().len(), 1, "immediate fetch on start");

    thread::sleep(Duration::from_millis(210));
    handle.cancel();

    let seen = log.lock().unwrap().clone();
    // ~235 ms of polling at 50 ms: deliveries at 0, 50, 100, 150, 200.
    assert!(
        (4..=6).contains(&seen.len()),
        "expected ~5 deliveries, got {}",
        seen.len()
    );
    // Deliveries arrive in completion order, one per fetch.
    let expected: Vec<u64> = (0..seen.len() as u64).collect();
    assert_eq!(seen, expected);
}

#[test]
fn failures_never_stop_the_poller() {
    let log = deliveries();
    let mut handle = poll::start(
        || FetchOutcome::<u64>::failure(ErrorKind::Network, "backend down"),
        Duration::from_millis(40),
        record(&log),
    );

    thread::sleep(Duration::from_millis(180));
    handle.cancel();

    let seen = log.lock().unwrap().clone();
    assert!(
        seen.len() >= 3,
        "poller must keep retrying through failures, got {} deliveries",
        seen.len()
    );
    assert!(seen.iter().all(|&v| v == u64::MAX));
}

#[test]
fn slow_fetch_skips_ticks_and_never_overlaps() {
    let log = deliveries();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let gauge = Arc::clone(&in_flight);

    // Each fetch runs past two 40 ms deadlines; those ticks must be skipped,
    // not queued.
    let mut handle = poll::start(
        move || {
            let concurrent = gauge.fetch_add(1, Ordering::SeqCst);
            assert_eq!(concurrent, 0, "a second fetch started while one was in flight");
            thread::sleep(Duration::from_millis(100));
            gauge.fetch_sub(1, Ordering::SeqCst);
            FetchOutcome::success(0u64)
        },
        Duration::from_millis(40),
        record(&log),
    );

    thread::sleep(Duration::from_millis(450));
    handle.cancel();
    // Let any in-flight fetch finish so its (discarded) completion runs.
    thread::sleep(Duration::from_millis(150));

    let count = log.lock().unwrap().len();
    // Fetches start at ~0, 120, 240, 360 ms; a naive queue would deliver 11+.
    assert!(
        (2..=4).contains(&count),
        "slow fetches should pace deliveries to ~one per 120 ms, got {count}"
    );
}

#[test]
fn cancel_is_idempotent() {
    let log = deliveries();
    let mut handle = poll::start(
        || FetchOutcome::success(1u64),
        Duration::from_millis(30),
        record(&log),
    );

    thread::sleep(Duration::from_millis(80));
    handle.cancel();
    let after_first_cancel = log.lock().unwrap().len();

    handle.cancel();
    handle.cancel();
    assert!(handle.is_cancelled());

    thread::sleep(Duration::from_millis(120));
    let after_second_cancel = log.lock().unwrap().len();
    assert_eq!(
        after_first_cancel, after_second_cancel,
        "repeated cancel must not change observable behavior"
    );
}

#[test]
fn cancel_before_first_fetch_resolves_delivers_nothing() {
    let log = deliveries();
    let mut handle = poll::start(
        || {
            thread::sleep(Duration::from_millis(80));
            FetchOutcome::success(7u64)
        },
        Duration::from_millis(40),
        record(&log),
    );

    // Cancel while the very first fetch is still in flight.
    handle.cancel();
    thread::sleep(Duration::from_millis(200));

    assert!(
        log.lock().unwrap().is_empty(),
        "an outcome completing after cancel must be discarded"
    );
}

#[test]
fn dropping_the_handle_cancels_the_poll() {
    let log = deliveries();
    {
        let _handle = poll::start(
            || {
                thread::sleep(Duration::from_millis(60));
                FetchOutcome::success(3u64)
            },
            Duration::from_millis(40),
            record(&log),
        );
        // Handle dropped here, before the first fetch resolves.
    }
    thread::sleep(Duration::from_millis(180));
    assert!(
        log.lock().unwrap().is_empty(),
        "drop must release the poll and suppress further deliveries"
    );
}

#[test]
fn stop_waits_for_the_worker_to_exit() {
    let log = deliveries();
    let handle = poll::start(
        || FetchOutcome::success(1u64),
        Duration::from_millis(20),
        record(&log),
    );

    thread::sleep(Duration::from_millis(50));
    handle.stop();

    let frozen = log.lock().unwrap().len();
    thread::sleep(Duration::from_millis(80));
    assert_eq!(frozen, log.lock().unwrap().len());
}
