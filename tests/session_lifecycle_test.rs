//! Integration tests for session lifecycle
//!
//! These tests validate the complete session workflow over a scripted
//! transport:
//! - Connection, stream close, and disconnection
//! - Status transition ordering
//! - Clearing ingested data
//! - Shutdown with an open stream

mod common;

use common::mock_helpers::{spawn_session, ScriptedTransport, UnreachableTransport};
use common::{drain_for, drain_until};
use serialvis_rs::session::SessionEvent;
use serialvis_rs::types::ConnectionStatus;
use std::time::Duration;

fn statuses(events: &[SessionEvent]) -> Vec<ConnectionStatus> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Status(s) => Some(*s),
            _ => None,
        })
        .collect()
}

#[test]
fn test_session_creation_and_shutdown() {
    let (handle, thread) = spawn_session(Box::new(ScriptedTransport::stay_open(&[])));

    handle.shutdown();
    let events = drain_until(&handle, |e| matches!(e, SessionEvent::Shutdown));

    assert!(events.iter().any(|e| matches!(e, SessionEvent::Shutdown)));
    thread.join().unwrap();
}

#[test]
fn test_connect_then_clean_close() {
    let transport = ScriptedTransport::new(&["{\"a\":1}\n{\"a\":2}\n"]);
    let (handle, thread) = spawn_session(Box::new(transport));

    handle.connect();
    let events = drain_until(&handle, |e| {
        matches!(e, SessionEvent::Status(ConnectionStatus::Disconnected))
    });

    assert_eq!(
        statuses(&events),
        vec![
            ConnectionStatus::Connecting,
            ConnectionStatus::Connected,
            ConnectionStatus::Disconnected,
        ]
    );

    let recomputed = events.iter().find_map(|e| match e {
        SessionEvent::Recomputed(snapshot) => Some(snapshot),
        _ => None,
    });
    assert_eq!(recomputed.unwrap().record_count, 2);

    handle.shutdown();
    thread.join().unwrap();
}

#[test]
fn test_commanded_disconnect_flushes_trailing_fragment() {
    // No trailing delimiter: the last record only exists once flushed
    let transport = ScriptedTransport::stay_open(&["{\"v\":7}"]);
    let (handle, thread) = spawn_session(Box::new(transport));

    handle.connect();
    drain_until(&handle, |e| {
        matches!(e, SessionEvent::Status(ConnectionStatus::Connected))
    });

    handle.disconnect();
    let events = drain_until(&handle, |e| {
        matches!(e, SessionEvent::Status(ConnectionStatus::Disconnected))
    });

    let snapshot = events
        .iter()
        .find_map(|e| match e {
            SessionEvent::Recomputed(snapshot) => Some(snapshot),
            _ => None,
        })
        .unwrap();
    assert_eq!(snapshot.record_count, 1);
    assert_eq!(snapshot.channel("v").unwrap().points[0].value, 7.0);

    handle.shutdown();
    thread.join().unwrap();
}

#[test]
fn test_connect_failure_reports_error() {
    let (handle, thread) = spawn_session(Box::new(UnreachableTransport));

    handle.connect();
    let events = drain_until(&handle, |e| {
        matches!(e, SessionEvent::Status(ConnectionStatus::Error))
    });

    let message = events
        .iter()
        .find_map(|e| match e {
            SessionEvent::ConnectionError(msg) => Some(msg.clone()),
            _ => None,
        })
        .unwrap();
    assert!(message.contains("Failed to connect to unreachable"));
    assert!(message.contains("no route to device"));

    handle.shutdown();
    thread.join().unwrap();
}

#[test]
fn test_errored_close_reports_reason() {
    let transport = ScriptedTransport::fail_with(&["{\"a\":1}\n"], "device unplugged");
    let (handle, thread) = spawn_session(Box::new(transport));

    handle.connect();
    let events = drain_until(&handle, |e| {
        matches!(e, SessionEvent::Status(ConnectionStatus::Error))
    });

    // Data ingested before the failure is still finalized
    let recomputed = events.iter().find_map(|e| match e {
        SessionEvent::Recomputed(snapshot) => Some(snapshot),
        _ => None,
    });
    assert_eq!(recomputed.unwrap().record_count, 1);
    assert!(events.iter().any(
        |e| matches!(e, SessionEvent::ConnectionError(msg) if msg.contains("device unplugged"))
    ));

    handle.shutdown();
    thread.join().unwrap();
}

#[test]
fn test_clear_data_resets_session() {
    let transport = ScriptedTransport::stay_open(&["{\"a\":1}\n{\"a\":2}\n"]);
    let (handle, thread) = spawn_session(Box::new(transport));

    handle.connect();
    // The throttled snapshot proves both records were ingested
    let events = drain_until(&handle, |e| matches!(e, SessionEvent::Snapshot(_)));
    let snapshot = events
        .iter()
        .find_map(|e| match e {
            SessionEvent::Snapshot(snapshot) => Some(snapshot),
            _ => None,
        })
        .unwrap();
    assert_eq!(snapshot.record_count, 2);

    handle.clear_data();
    drain_until(&handle, |e| matches!(e, SessionEvent::Cleared));

    handle.recompute();
    let events = drain_until(&handle, |e| matches!(e, SessionEvent::Recomputed(_)));
    let recomputed = events
        .iter()
        .find_map(|e| match e {
            SessionEvent::Recomputed(snapshot) => Some(snapshot),
            _ => None,
        })
        .unwrap();
    assert_eq!(recomputed.record_count, 0);
    assert!(recomputed.is_empty());

    handle.shutdown();
    thread.join().unwrap();
}

#[test]
fn test_connect_while_connected_is_ignored() {
    let (handle, thread) = spawn_session(Box::new(ScriptedTransport::stay_open(&[])));

    handle.connect();
    drain_until(&handle, |e| {
        matches!(e, SessionEvent::Status(ConnectionStatus::Connected))
    });

    handle.connect();
    let events = drain_for(&handle, Duration::from_millis(100));
    assert!(statuses(&events).is_empty());

    handle.shutdown();
    thread.join().unwrap();
}

#[test]
fn test_shutdown_finalizes_open_stream() {
    let transport = ScriptedTransport::stay_open(&["{\"v\":7}"]);
    let (handle, thread) = spawn_session(Box::new(transport));

    handle.connect();
    drain_until(&handle, |e| {
        matches!(e, SessionEvent::Status(ConnectionStatus::Connected))
    });

    handle.shutdown();
    let events = drain_until(&handle, |e| matches!(e, SessionEvent::Shutdown));

    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::Status(ConnectionStatus::Disconnected))));
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::Recomputed(s) if s.record_count == 1)));

    thread.join().unwrap();
}
