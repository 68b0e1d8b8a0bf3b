//! Serial port transport
//!
//! Opens the configured port and forwards whatever the device writes as raw
//! text chunks. The reader runs on its own thread with a short read timeout
//! so a disconnect request is honored within one timeout period.

use crate::config::{ParityMode, SerialConfig};
use crate::error::{Result, ResultExt, SerialVisError};
use crate::transport::{Transport, TransportEvent};
use crossbeam_channel::Sender;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Port read timeout; also bounds how long a disconnect can take
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Read buffer size in bytes
const READ_BUFFER_SIZE: usize = 4096;

/// Transport reading from a serial port via a dedicated thread
pub struct SerialTransport {
    config: SerialConfig,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl SerialTransport {
    /// Create a transport for the given port configuration
    pub fn new(config: SerialConfig) -> Self {
        Self {
            config,
            stop: Arc::new(AtomicBool::new(false)),
            reader: None,
        }
    }
}

impl Transport for SerialTransport {
    fn connect(&mut self, events: Sender<TransportEvent>) -> Result<()> {
        if self.is_connected() {
            return Err(SerialVisError::Transport(
                "transport is already connected".to_string(),
            ));
        }
        self.config.validate()?;

        let port = serialport::new(&self.config.port, self.config.baud_rate)
            .data_bits(map_data_bits(self.config.data_bits)?)
            .stop_bits(map_stop_bits(self.config.stop_bits)?)
            .parity(map_parity(self.config.parity))
            .timeout(READ_TIMEOUT)
            .open()
            .with_context(|| format!("Failed to open serial port {}", self.config.port))?;

        tracing::info!(
            "Opened serial port {} at {} baud",
            self.config.port,
            self.config.baud_rate
        );

        self.stop.store(false, Ordering::SeqCst);
        let stop = Arc::clone(&self.stop);
        self.reader = Some(std::thread::spawn(move || read_loop(port, events, stop)));
        Ok(())
    }

    fn disconnect(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                tracing::error!("Serial reader thread panicked");
            }
            tracing::info!("Closed serial port {}", self.config.port);
        }
    }

    fn is_connected(&self) -> bool {
        self.reader.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn describe(&self) -> String {
        format!("{} @ {}", self.config.port, self.config.baud_rate)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn read_loop(
    mut port: Box<dyn SerialPort>,
    events: Sender<TransportEvent>,
    stop: Arc<AtomicBool>,
) {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        if stop.load(Ordering::SeqCst) {
            // Locally commanded disconnect; the session already knows
            break;
        }

        match port.read(&mut buf) {
            Ok(0) => {
                flush_pending(&mut pending, &events);
                tracing::info!("Serial stream ended");
                let _ = events.send(TransportEvent::Closed { reason: None });
                break;
            }
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                if let Some(chunk) = split_valid_prefix(&mut pending) {
                    if events.send(TransportEvent::Chunk(chunk)).is_err() {
                        // Receiver gone; the session is shutting down
                        break;
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                flush_pending(&mut pending, &events);
                tracing::warn!("Serial read failed: {}", e);
                let _ = events.send(TransportEvent::Closed {
                    reason: Some(e.to_string()),
                });
                break;
            }
        }
    }
}

/// Split the longest decodable UTF-8 prefix out of `pending`
///
/// A read may end in the middle of a multi-byte character; up to three
/// trailing bytes are held back for the next read instead of being mangled.
/// Genuinely invalid bytes are replaced so a corrupt stream cannot stall.
fn split_valid_prefix(pending: &mut Vec<u8>) -> Option<String> {
    if pending.is_empty() {
        return None;
    }
    let valid_len = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => pending.len(),
    };
    if valid_len == 0 {
        return None;
    }
    let tail = pending.split_off(valid_len);
    let chunk = String::from_utf8_lossy(pending).into_owned();
    *pending = tail;
    Some(chunk)
}

fn flush_pending(pending: &mut Vec<u8>, events: &Sender<TransportEvent>) {
    if !pending.is_empty() {
        let chunk = String::from_utf8_lossy(pending).into_owned();
        pending.clear();
        let _ = events.send(TransportEvent::Chunk(chunk));
    }
}

fn map_data_bits(bits: u8) -> Result<DataBits> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        other => Err(SerialVisError::Config(format!(
            "Invalid data bits: {} (expected 5-8)",
            other
        ))),
    }
}

fn map_stop_bits(bits: u8) -> Result<StopBits> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        other => Err(SerialVisError::Config(format!(
            "Invalid stop bits: {} (expected 1 or 2)",
            other
        ))),
    }
}

fn map_parity(parity: ParityMode) -> Parity {
    match parity {
        ParityMode::None => Parity::None,
        ParityMode::Odd => Parity::Odd,
        ParityMode::Even => Parity::Even,
    }
}
