//! Transport abstraction for chunk sources
//!
//! This module provides a common trait for everything that can supply raw
//! text chunks: a real serial port, or the feature-gated mock generator for
//! testing without hardware. A transport owns its reader thread and reports
//! through a channel; framing and parsing stay out of it entirely.

pub mod serial;

#[cfg(feature = "mock-transport")]
pub mod mock;

pub use serial::SerialTransport;

#[cfg(feature = "mock-transport")]
pub use mock::{MockChannel, MockTransport, MockWave};

use crate::error::Result;
use crossbeam_channel::Sender;

/// Event pushed by a transport's reader thread
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// One raw text chunk, sliced however the device delivered it
    Chunk(String),
    /// The stream ended; `reason` is None when the stream closed cleanly
    Closed { reason: Option<String> },
}

/// Unified interface for chunk sources
///
/// Implementations must be `Send` so the session worker can own them on its
/// thread. `connect` hands the transport the sender half of the chunk
/// channel; everything the device produces afterwards arrives as
/// [`TransportEvent`]s until `Closed` is sent or `disconnect` is called.
pub trait Transport: Send {
    /// Open the underlying stream and start forwarding chunks
    fn connect(&mut self, events: Sender<TransportEvent>) -> Result<()>;

    /// Stop forwarding and release the underlying stream
    ///
    /// Idempotent; must join any reader thread before returning.
    fn disconnect(&mut self);

    /// Check if the transport is currently streaming
    fn is_connected(&self) -> bool;

    /// Short human-readable description for logs (e.g. "/dev/ttyUSB0 @ 115200")
    fn describe(&self) -> String;
}
