//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use crossbeam_channel::RecvTimeoutError;
use serialvis_rs::session::{SessionEvent, SessionHandle};
use std::time::{Duration, Instant};

/// How long tests wait for an expected session event
pub fn test_timeout() -> Duration {
    Duration::from_secs(2)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Collect session events until one matches the predicate
///
/// Returns every event received so far, with the matching event last. Panics
/// if the timeout expires first, so a missing event fails with the events
/// that did arrive instead of a bare hang.
pub fn drain_until(
    handle: &SessionHandle,
    mut stop: impl FnMut(&SessionEvent) -> bool,
) -> Vec<SessionEvent> {
    let deadline = Instant::now() + test_timeout();
    let mut events = Vec::new();

    while Instant::now() < deadline {
        match handle.receiver.recv_timeout(Duration::from_millis(20)) {
            Ok(event) => {
                let matched = stop(&event);
                events.push(event);
                if matched {
                    return events;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    panic!("Expected event did not arrive; got {:?}", events);
}

/// Collect whatever arrives within the window, asserting nothing
pub fn drain_for(handle: &SessionHandle, window: Duration) -> Vec<SessionEvent> {
    let deadline = Instant::now() + window;
    let mut events = Vec::new();

    while Instant::now() < deadline {
        match handle.receiver.recv_timeout(Duration::from_millis(20)) {
            Ok(event) => events.push(event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    events
}
