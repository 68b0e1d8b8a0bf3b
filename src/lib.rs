//! # SerialVis-RS: Serial Stream Ingestion Engine
//!
//! A time-series aggregation engine that ingests delimited JSON records from
//! a serial byte stream and maintains per-channel sample series. The
//! architecture separates the ingestion session from the consumer: the
//! session owns all data on its own thread and publishes immutable snapshots
//! at a throttled rate.
//!
//! ## Architecture
//!
//! - **Transport**: Reads raw chunks from a serial port (or a mock device)
//!   on a dedicated thread
//! - **Session**: Reassembles records, parses them, and maintains the raw
//!   record log plus per-channel series
//! - **Export**: Recomputes snapshots, CSV renderings, and statistics from
//!   the raw record log alone
//! - **Communication**: Crossbeam channels for thread-safe data transfer
//!
//! ## Raw log authority
//!
//! Every record is retained verbatim in the raw record log, whether it
//! parsed or not. All derived views (snapshots, CSV, statistics) can be
//! rebuilt from the log alone, so the log is the single source of truth and
//! a recompute always agrees with what was actually received.
//!
//! ## Configuration
//!
//! Session profiles are stored in the platform-appropriate data directory
//! under `serialvis-rs`:
//!
//! - **Linux**: `~/.local/share/serialvis-rs/`
//! - **macOS**: `~/Library/Application Support/serialvis-rs/`
//! - **Windows**: `%APPDATA%\serialvis-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use serialvis_rs::{
//!     config::SessionProfile,
//!     session::{SessionEvent, SessionRunner},
//!     transport::SerialTransport,
//! };
//!
//! fn main() {
//!     let profile = SessionProfile::load_or_default(&profile_path);
//!
//!     let transport = Box::new(SerialTransport::new(profile.serial.clone()));
//!     let (runner, handle) = SessionRunner::new(profile.session.clone(), transport);
//!
//!     std::thread::spawn(move || runner.run());
//!     handle.connect();
//!
//!     loop {
//!         for event in handle.drain() {
//!             match event {
//!                 SessionEvent::Snapshot(snapshot) => {
//!                     // Plot the updated series
//!                 }
//!                 SessionEvent::Status(status) => {
//!                     // Reflect connection state
//!                 }
//!                 _ => {}
//!             }
//!         }
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod session;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::{SerialConfig, SessionConfig, SessionProfile};
pub use error::{Result, SerialVisError};
pub use session::{SessionCommand, SessionEvent, SessionHandle, SessionRunner};
pub use transport::{SerialTransport, Transport, TransportEvent};
pub use types::{ChannelStats, ConnectionStatus, IngestStats, Sample, SessionSnapshot};
