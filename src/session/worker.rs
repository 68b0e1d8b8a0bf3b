//! Session Worker Thread Implementation
//!
//! This module contains the main worker loop that runs in a separate thread
//! and owns all session data. It communicates with the caller thread through
//! crossbeam channels.
//!
//! # Responsibilities
//!
//! The worker thread handles:
//!
//! - **Command processing**: Responds to caller commands (connect, clear,
//!   export, etc.)
//! - **Chunk ingestion**: Reassembles transport chunks into records and
//!   appends them to the session
//! - **Snapshot publishing**: Emits throttled snapshots so a burst of records
//!   produces one update instead of hundreds
//! - **Statistics tracking**: Counts chunks, records, rejections, and drops
//! - **Stream teardown**: Flushes the trailing record fragment and publishes
//!   a final recomputed snapshot when the stream ends
//!
//! # Single Writer
//!
//! All mutation of [`SessionState`] happens on this thread. Callers only see
//! owned [`SessionSnapshot`](crate::types::SessionSnapshot) values carried by
//! events, so no lock is ever taken on the live series.

use crate::config::SessionConfig;
use crate::error::ResultExt;
use crate::export;
use crate::session::publisher::{Clock, SystemClock, ThrottledPublisher};
use crate::session::reassembler::RecordReassembler;
use crate::session::state::{IngestOutcome, SessionState};
use crate::session::{SessionCommand, SessionEvent};
use crate::transport::{Transport, TransportEvent};
use crate::types::ConnectionStatus;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Idle sleep when no publish deadline is pending
const IDLE_TICK: Duration = Duration::from_millis(10);

/// The session worker that runs the ingestion loop
pub struct SessionWorker {
    /// Session configuration
    config: SessionConfig,
    /// Command receiver from the caller
    command_rx: Receiver<SessionCommand>,
    /// Event sender to the caller
    event_tx: Sender<SessionEvent>,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Transport producing raw chunks (serial port or mock)
    transport: Box<dyn Transport>,
    /// Receiver for transport events while a stream is open
    transport_rx: Option<Receiver<TransportEvent>>,
    /// Splits the chunk stream into delimited records
    reassembler: RecordReassembler,
    /// Raw record log, channel registry, and sample series
    state: SessionState,
    /// Coalesces snapshot publications to the configured interval
    publisher: ThrottledPublisher<()>,
    /// Time source (virtual in tests)
    clock: Arc<dyn Clock>,
    /// Last time ingest stats were sent
    last_stats_time: Instant,
}

impl SessionWorker {
    /// Create a new session worker
    pub fn new(
        config: SessionConfig,
        transport: Box<dyn Transport>,
        command_rx: Receiver<SessionCommand>,
        event_tx: Sender<SessionEvent>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let reassembler = RecordReassembler::new(config.delimiter.clone());
        let publisher = ThrottledPublisher::new(config.publish_interval());
        let last_stats_time = clock.now();

        Self {
            config,
            command_rx,
            event_tx,
            running,
            transport,
            transport_rx: None,
            reassembler,
            state: SessionState::new(),
            publisher,
            clock,
            last_stats_time,
        }
    }

    /// Replace the time source (used by tests to drive the throttle)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.last_stats_time = clock.now();
        self.clock = clock;
        self
    }

    /// Run the main worker loop
    pub fn run(&mut self) {
        tracing::info!("Session worker started");

        while self.running.load(Ordering::SeqCst) {
            self.process_commands();
            self.drain_transport();
            self.poll_publisher();

            // Send ingest stats periodically while a stream is open
            let now = self.clock.now();
            if self.transport_rx.is_some()
                && now.saturating_duration_since(self.last_stats_time)
                    >= self.config.stats_interval()
            {
                self.send_stats();
                self.last_stats_time = now;
            }

            self.tick();
        }

        // Cleanup
        if self.transport_rx.is_some() {
            self.transport.disconnect();
            self.drain_transport();
            self.finalize_stream(None);
        }

        let _ = self.event_tx.send(SessionEvent::Shutdown);
        tracing::info!("Session worker stopped");
    }

    /// Process pending commands from the caller
    fn process_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    /// Handle a single command
    fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Connect => {
                self.handle_connect();
            }
            SessionCommand::Disconnect => {
                self.handle_disconnect();
            }
            SessionCommand::ClearData => {
                self.handle_clear();
            }
            SessionCommand::Recompute => {
                let snapshot = export::recompute(self.state.log());
                let _ = self.event_tx.send(SessionEvent::Recomputed(snapshot));
            }
            SessionCommand::ExportCsv => {
                let csv = export::to_csv(self.state.log());
                let _ = self.event_tx.send(SessionEvent::Csv(csv));
            }
            SessionCommand::RequestStatistics => {
                let stats = export::statistics(self.state.log());
                let _ = self.event_tx.send(SessionEvent::Statistics(stats));
            }
            SessionCommand::RequestStats => {
                self.send_stats();
            }
            SessionCommand::SetPublishInterval(interval) => {
                tracing::debug!("Publish interval set to {:?}", interval);
                self.publisher.set_interval(interval);
            }
            SessionCommand::Shutdown => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Handle connect command
    fn handle_connect(&mut self) {
        if self.transport_rx.is_some() {
            tracing::warn!("Connect requested while already connected");
            return;
        }
        self.update_status(ConnectionStatus::Connecting);

        let (chunk_tx, chunk_rx) = bounded(self.config.chunk_channel_capacity);
        let result = self
            .transport
            .connect(chunk_tx)
            .with_context(|| format!("Failed to connect to {}", self.transport.describe()));

        match result {
            Ok(()) => {
                self.transport_rx = Some(chunk_rx);
                self.reassembler.clear();
                self.last_stats_time = self.clock.now();
                self.update_status(ConnectionStatus::Connected);
                tracing::info!("Connected to {}", self.transport.describe());
            }
            Err(e) => {
                let error_msg = e.to_string();
                tracing::error!("{}", error_msg);
                // Details first: callers that stop on the Error status still
                // see the message that caused it.
                let _ = self.event_tx.send(SessionEvent::ConnectionError(error_msg));
                self.update_status(ConnectionStatus::Error);
            }
        }
    }

    /// Handle disconnect command
    fn handle_disconnect(&mut self) {
        if self.transport_rx.is_none() {
            tracing::warn!("Disconnect requested while not connected");
            return;
        }
        self.transport.disconnect();
        // Chunks the reader already queued still count
        self.drain_transport();
        self.finalize_stream(None);
    }

    /// Discard all ingested data
    fn handle_clear(&mut self) {
        self.state.clear();
        // A pending snapshot would republish data that no longer exists
        self.publisher.cancel();
        let _ = self.event_tx.send(SessionEvent::Cleared);
    }

    /// Drain pending transport events without blocking
    fn drain_transport(&mut self) {
        let Some(rx) = self.transport_rx.clone() else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(TransportEvent::Chunk(chunk)) => {
                    self.ingest_chunk(&chunk);
                }
                Ok(TransportEvent::Closed { reason }) => {
                    self.transport.disconnect();
                    self.finalize_stream(reason);
                    return;
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    // Reader thread ended without a close event
                    self.transport.disconnect();
                    self.finalize_stream(None);
                    return;
                }
            }
        }
    }

    /// Ingest one raw chunk from the transport
    fn ingest_chunk(&mut self, chunk: &str) {
        let stats = self.state.stats_mut();
        stats.chunks_received += 1;
        stats.bytes_received += chunk.len() as u64;

        for record in self.reassembler.push(chunk) {
            self.ingest_record(record);
        }
    }

    /// Append one complete record to the session and request a publish
    fn ingest_record(&mut self, record: String) {
        match self.state.ingest_record(record) {
            IngestOutcome::Parsed { new_channels, .. } => {
                for (index, name) in new_channels {
                    self.try_send_event(SessionEvent::ChannelDiscovered { index, name });
                }
            }
            IngestOutcome::Rejected { index, message } => {
                self.try_send_event(SessionEvent::RecordRejected {
                    sample_index: index,
                    message,
                });
            }
        }
        self.request_publish();
    }

    /// Ask the publisher for a snapshot, coalescing with any pending request
    fn request_publish(&mut self) {
        if self.publisher.has_pending() {
            self.state.stats_mut().requests_coalesced += 1;
        }
        self.publisher.request(self.clock.now(), ());
    }

    /// Publish a snapshot if the throttle deadline has passed
    fn poll_publisher(&mut self) {
        if self.publisher.poll(self.clock.now()).is_some() {
            self.publish_snapshot();
        }
    }

    /// Build and send a snapshot of the live series
    fn publish_snapshot(&mut self) {
        let snapshot = self.state.snapshot();
        self.state.stats_mut().snapshots_published += 1;
        self.try_send_event(SessionEvent::Snapshot(snapshot));
    }

    /// Tear down the open stream and publish the authoritative final state
    ///
    /// Trailing bytes with no final delimiter still form one record, and the
    /// closing snapshot is rebuilt from the raw log rather than taken from
    /// the live series, so it reflects every record ever ingested.
    fn finalize_stream(&mut self, reason: Option<String>) {
        if self.transport_rx.take().is_none() {
            return;
        }

        if let Some(fragment) = self.reassembler.finish() {
            self.ingest_record(fragment);
        }
        self.publisher.flush(self.clock.now());

        let snapshot = export::recompute(self.state.log());
        let _ = self.event_tx.send(SessionEvent::Recomputed(snapshot));
        self.send_stats();

        match reason {
            Some(message) => {
                tracing::warn!("Stream closed: {}", message);
                let _ = self.event_tx.send(SessionEvent::ConnectionError(message));
                self.update_status(ConnectionStatus::Error);
            }
            None => {
                tracing::info!("Stream closed after {} records", self.state.record_count());
                self.update_status(ConnectionStatus::Disconnected);
            }
        }
    }

    /// Sleep until the next publish deadline, capped at the idle tick
    fn tick(&self) {
        let now = self.clock.now();
        let wait = match self.publisher.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now).min(IDLE_TICK),
            None => IDLE_TICK,
        };
        if wait.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(wait);
        }
    }

    /// Update connection status and notify the caller
    fn update_status(&mut self, status: ConnectionStatus) {
        self.state.set_status(status);
        let _ = self.event_tx.send(SessionEvent::Status(status));
    }

    /// Send ingest counters (using try_send for backpressure)
    fn send_stats(&mut self) {
        let stats = self.state.stats().clone();
        self.try_send_event(SessionEvent::Stats(stats));
    }

    /// Try to send an event, tracking dropped events if the queue is full
    ///
    /// Uses try_send() to avoid blocking. If the queue is full, the event is
    /// dropped and the dropped_events counter is incremented.
    fn try_send_event(&mut self, event: SessionEvent) {
        if self.event_tx.try_send(event).is_err() {
            self.state.stats_mut().dropped_events += 1;
        }
    }
}
