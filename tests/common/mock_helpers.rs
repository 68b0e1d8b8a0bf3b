//! Scripted transports for driving a session without hardware

use crossbeam_channel::Sender;
use serialvis_rs::config::SessionConfig;
use serialvis_rs::error::{Result, SerialVisError};
use serialvis_rs::session::{SessionHandle, SessionRunner};
use serialvis_rs::transport::{Transport, TransportEvent};
use std::thread::JoinHandle;

enum CloseBehavior {
    /// Send the chunks, then a clean close
    Clean,
    /// Send the chunks and keep the stream open until disconnect
    StayOpen,
    /// Send the chunks, then close with an error reason
    Fail(String),
}

/// Transport that replays a fixed chunk script when connected
///
/// Chunks are delivered synchronously during connect, so by the time the
/// session reports Connected the entire script is already queued.
pub struct ScriptedTransport {
    chunks: Vec<String>,
    close: CloseBehavior,
    held: Option<Sender<TransportEvent>>,
}

impl ScriptedTransport {
    /// Chunks followed by a clean close
    pub fn new(chunks: &[&str]) -> Self {
        Self::with_close(chunks, CloseBehavior::Clean)
    }

    /// Chunks, then the stream stays open until disconnect
    pub fn stay_open(chunks: &[&str]) -> Self {
        Self::with_close(chunks, CloseBehavior::StayOpen)
    }

    /// Chunks followed by an errored close
    pub fn fail_with(chunks: &[&str], reason: &str) -> Self {
        Self::with_close(chunks, CloseBehavior::Fail(reason.to_string()))
    }

    fn with_close(chunks: &[&str], close: CloseBehavior) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            close,
            held: None,
        }
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self, events: Sender<TransportEvent>) -> Result<()> {
        for chunk in self.chunks.drain(..) {
            let _ = events.send(TransportEvent::Chunk(chunk));
        }
        match &self.close {
            CloseBehavior::Clean => {
                let _ = events.send(TransportEvent::Closed { reason: None });
            }
            CloseBehavior::Fail(reason) => {
                let _ = events.send(TransportEvent::Closed {
                    reason: Some(reason.clone()),
                });
            }
            CloseBehavior::StayOpen => {}
        }
        self.held = Some(events);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.held = None;
    }

    fn is_connected(&self) -> bool {
        self.held.is_some()
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Transport whose connect always fails
pub struct UnreachableTransport;

impl Transport for UnreachableTransport {
    fn connect(&mut self, _events: Sender<TransportEvent>) -> Result<()> {
        Err(SerialVisError::Transport("no route to device".to_string()))
    }

    fn disconnect(&mut self) {}

    fn is_connected(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        "unreachable".to_string()
    }
}

/// Spawn a session over the given transport with default configuration
pub fn spawn_session(transport: Box<dyn Transport>) -> (SessionHandle, JoinHandle<()>) {
    spawn_session_with(SessionConfig::default(), transport)
}

/// Spawn a session over the given transport with a custom configuration
pub fn spawn_session_with(
    config: SessionConfig,
    transport: Box<dyn Transport>,
) -> (SessionHandle, JoinHandle<()>) {
    let (runner, handle) = SessionRunner::new(config, transport);
    let thread = std::thread::spawn(move || runner.run());
    (handle, thread)
}
