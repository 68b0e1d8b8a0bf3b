//! Session module for serial stream ingestion
//!
//! This module handles all stream ingestion in a separate thread to keep
//! callers responsive. It uses crossbeam channels for thread-safe
//! communication with the caller.
//!
//! # Architecture
//!
//! The session runs in a separate thread from the caller, communicating via
//! channels:
//!
//! - [`SessionCommand`] - Messages sent from the caller to the session
//!   (connect, clear, export, etc.)
//! - [`SessionEvent`] - Messages sent from the session to the caller
//!   (snapshots, discoveries, errors)
//! - [`SessionHandle`] - Caller-side handle for sending commands and
//!   receiving events
//! - [`SessionRunner`] - Main entry point that drives the worker loop
//!
//! # Components
//!
//! - [`RecordReassembler`] - Splits the chunk stream into delimited records
//! - [`SessionState`] - Raw record log, channel registry, and sample series
//! - [`ThrottledPublisher`] - Coalesces snapshot publications to a minimum
//!   spacing
//! - [`SessionWorker`] - Worker loop that processes commands and ingests
//!   chunks
//!
//! # Example
//!
//! ```ignore
//! use serialvis_rs::config::SessionConfig;
//! use serialvis_rs::session::{SessionEvent, SessionRunner};
//! use serialvis_rs::transport::SerialTransport;
//!
//! let transport = Box::new(SerialTransport::new(serial_config));
//! let (runner, handle) = SessionRunner::new(SessionConfig::default(), transport);
//!
//! // Spawn the session thread
//! std::thread::spawn(move || runner.run());
//!
//! // Send commands from the caller
//! handle.connect();
//!
//! // Receive events
//! for event in handle.drain() {
//!     match event {
//!         SessionEvent::Snapshot(snapshot) => {
//!             // Plot the updated series
//!         }
//!         _ => {}
//!     }
//! }
//! ```

pub mod parser;
pub mod publisher;
pub mod reassembler;
pub mod registry;
pub mod state;
pub mod store;
pub mod worker;

pub use parser::{numeric_value, parse_record, ParsedRecord};
pub use publisher::{Clock, SystemClock, ThrottledPublisher};
pub use reassembler::RecordReassembler;
pub use registry::ChannelRegistry;
pub use state::{IngestOutcome, SessionState};
pub use store::{RawRecordLog, SeriesStore};
pub use worker::SessionWorker;

use crate::config::SessionConfig;
use crate::transport::Transport;
use crate::types::{ChannelStats, ConnectionStatus, IngestStats, SessionSnapshot};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Message sent from the caller to the session
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Open the transport and start ingesting its stream
    Connect,
    /// Stop the transport, flush any trailing record, and publish a final
    /// recomputed snapshot
    Disconnect,
    /// Discard all ingested data (raw log, channels, series)
    ClearData,
    /// Rebuild a snapshot from the raw record log and send it back
    Recompute,
    /// Render the raw record log as CSV and send it back
    ExportCsv,
    /// Compute per-channel statistics from the raw record log
    RequestStatistics,
    /// Request current ingest counters
    RequestStats,
    /// Change the minimum spacing between published snapshots
    SetPublishInterval(Duration),
    /// Shutdown the session
    Shutdown,
}

/// Message sent from the session to the caller
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Connection status changed
    Status(ConnectionStatus),
    /// Connection or stream error occurred
    ConnectionError(String),
    /// A channel key was seen for the first time
    ChannelDiscovered { index: usize, name: String },
    /// A record failed to parse and was kept only in the raw log
    RecordRejected { sample_index: u64, message: String },
    /// Throttled snapshot of the live series
    Snapshot(SessionSnapshot),
    /// Authoritative snapshot rebuilt from the raw record log
    Recomputed(SessionSnapshot),
    /// CSV rendering of the raw record log
    Csv(String),
    /// Per-channel statistics
    Statistics(Vec<ChannelStats>),
    /// Ingest counters update
    Stats(IngestStats),
    /// All session data was discarded
    Cleared,
    /// Session is shutting down
    Shutdown,
}

/// Caller-side handle for a running session
pub struct SessionHandle {
    /// Receiver for session events
    pub receiver: Receiver<SessionEvent>,
    /// Sender for commands to the session
    pub command_sender: Sender<SessionCommand>,
}

impl SessionHandle {
    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<SessionEvent> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending events
    pub fn drain(&self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Send a command to the session
    pub fn send_command(&self, cmd: SessionCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    /// Request a transport connection
    pub fn connect(&self) {
        let _ = self.command_sender.send(SessionCommand::Connect);
    }

    /// Request disconnection
    pub fn disconnect(&self) {
        let _ = self.command_sender.send(SessionCommand::Disconnect);
    }

    /// Discard all ingested data
    pub fn clear_data(&self) {
        let _ = self.command_sender.send(SessionCommand::ClearData);
    }

    /// Request a snapshot rebuilt from the raw record log
    pub fn recompute(&self) {
        let _ = self.command_sender.send(SessionCommand::Recompute);
    }

    /// Request a CSV rendering of the raw record log
    pub fn export_csv(&self) {
        let _ = self.command_sender.send(SessionCommand::ExportCsv);
    }

    /// Request per-channel statistics
    pub fn request_statistics(&self) {
        let _ = self.command_sender.send(SessionCommand::RequestStatistics);
    }

    /// Request current ingest counters
    pub fn request_stats(&self) {
        let _ = self.command_sender.send(SessionCommand::RequestStats);
    }

    /// Change the snapshot publish interval
    pub fn set_publish_interval(&self, interval: Duration) {
        let _ = self
            .command_sender
            .send(SessionCommand::SetPublishInterval(interval));
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(SessionCommand::Shutdown);
    }
}

/// The session that runs in a separate thread
pub struct SessionRunner {
    /// Configuration
    config: SessionConfig,
    /// Transport producing the raw chunk stream
    transport: Box<dyn Transport>,
    /// Receiver for commands from the caller
    command_receiver: Receiver<SessionCommand>,
    /// Sender for events to the caller
    event_sender: Sender<SessionEvent>,
    /// Running flag
    running: Arc<AtomicBool>,
}

impl SessionRunner {
    /// Create a new session with communication channels
    pub fn new(config: SessionConfig, transport: Box<dyn Transport>) -> (Self, SessionHandle) {
        let (cmd_tx, cmd_rx) = bounded(256);
        // Use bounded channel for backpressure - prevents memory spikes if the
        // caller can't keep up. 10,000 events covers several seconds of
        // discovery and rejection chatter at high record rates.
        let (event_tx, event_rx) = bounded(10_000);

        let runner = Self {
            config,
            transport,
            command_receiver: cmd_rx,
            event_sender: event_tx,
            running: Arc::new(AtomicBool::new(true)),
        };

        let handle = SessionHandle {
            receiver: event_rx,
            command_sender: cmd_tx,
        };

        (runner, handle)
    }

    /// Run the session loop
    pub fn run(self) {
        let mut worker = SessionWorker::new(
            self.config,
            self.transport,
            self.command_receiver,
            self.event_sender,
            self.running,
        );
        worker.run();
    }

    /// Get a handle to stop the session
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportEvent;
    use std::sync::atomic::Ordering;

    struct NullTransport;

    impl Transport for NullTransport {
        fn connect(&mut self, _events: Sender<TransportEvent>) -> crate::error::Result<()> {
            Ok(())
        }
        fn disconnect(&mut self) {}
        fn is_connected(&self) -> bool {
            false
        }
        fn describe(&self) -> String {
            "null".to_string()
        }
    }

    #[test]
    fn test_runner_creation() {
        let (runner, handle) =
            SessionRunner::new(SessionConfig::default(), Box::new(NullTransport));

        // Session should be running
        assert!(runner.running.load(Ordering::SeqCst));

        // Should be able to send commands
        assert!(handle.send_command(SessionCommand::Shutdown));
    }

    #[test]
    fn test_handle_commands() {
        let (runner, handle) = SessionRunner::new(SessionConfig::default(), Box::new(NullTransport));

        handle.connect();
        handle.clear_data();
        handle.recompute();
        handle.export_csv();
        handle.request_statistics();
        handle.request_stats();
        handle.set_publish_interval(Duration::from_millis(100));
        handle.disconnect();
        handle.shutdown();

        let mut count = 0;
        while runner.command_receiver.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 9);
    }
}
