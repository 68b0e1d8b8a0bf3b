//! Mock Transport for Testing
//!
//! This module provides a mock transport that can be used for testing and
//! demos without real hardware. It emits JSON records at a configurable rate
//! and splits the byte stream at random positions, so chunk reassembly is
//! exercised the same way a real serial driver would exercise it.
//!
//! # Waveforms
//!
//! Each mock channel generates values from one of several waveforms:
//!
//! - [`MockWave::Constant`] - Fixed value (useful for testing static displays)
//! - [`MockWave::Sine`] - Sinusoidal wave with configurable frequency/amplitude
//! - [`MockWave::Counter`] - Incrementing counter
//! - [`MockWave::Random`] - Random values within a range
//! - [`MockWave::Square`] - Square wave alternating between two values
//!
//! # Enabling
//!
//! The mock transport is only available when the `mock-transport` feature is
//! enabled:
//!
//! ```bash
//! cargo run --features mock-transport -- --mock
//! ```

use crate::error::{Result, SerialVisError};
use crate::transport::{Transport, TransportEvent};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Waveform generated for one mock channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockWave {
    /// Constant value
    Constant(f64),
    /// Sine wave with frequency and amplitude
    Sine {
        frequency: f64,
        amplitude: f64,
        offset: f64,
    },
    /// Counter that increments per record
    Counter { step: f64 },
    /// Random values within range
    Random { min: f64, max: f64 },
    /// Square wave
    Square { period: f64, amplitude: f64 },
}

impl Default for MockWave {
    fn default() -> Self {
        MockWave::Sine {
            frequency: 1.0,
            amplitude: 100.0,
            offset: 0.0,
        }
    }
}

/// One channel emitted by the mock device
#[derive(Debug, Clone)]
pub struct MockChannel {
    /// Key used in the emitted JSON records
    pub name: String,
    /// Data generation waveform
    pub wave: MockWave,
    /// Current counter value (for Counter waveform)
    counter_value: f64,
}

impl MockChannel {
    /// Create a new mock channel
    pub fn new(name: impl Into<String>, wave: MockWave) -> Self {
        Self {
            name: name.into(),
            wave,
            counter_value: 0.0,
        }
    }

    /// Generate a value based on the waveform and elapsed time
    fn generate_value(&mut self, elapsed_secs: f64) -> f64 {
        match self.wave {
            MockWave::Constant(v) => v,
            MockWave::Sine {
                frequency,
                amplitude,
                offset,
            } => offset + amplitude * (2.0 * std::f64::consts::PI * frequency * elapsed_secs).sin(),
            MockWave::Counter { step } => {
                self.counter_value += step;
                self.counter_value
            }
            MockWave::Random { min, max } => min + rand_simple() * (max - min),
            MockWave::Square { period, amplitude } => {
                let t = elapsed_secs % period;
                if t < period / 2.0 {
                    amplitude
                } else {
                    -amplitude
                }
            }
        }
    }
}

/// Simple pseudo-random number generator (no external dependency)
fn rand_simple() -> f64 {
    use std::cell::Cell;
    thread_local! {
        static SEED: Cell<u64> = Cell::new(987_654_321);
    }
    SEED.with(|seed| {
        let mut s = seed.get();
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        seed.set(s);
        (s as f64) / (u64::MAX as f64)
    })
}

/// Mock transport emitting generated newline-delimited JSON records
pub struct MockTransport {
    channels: Vec<MockChannel>,
    rate_hz: f64,
    record_limit: Option<u64>,
    corrupt_every: Option<u64>,
    stop: Arc<AtomicBool>,
    generator: Option<JoinHandle<()>>,
}

impl MockTransport {
    /// Create a mock transport with a default channel set
    pub fn new() -> Self {
        Self {
            channels: vec![
                MockChannel::new("sine", MockWave::default()),
                MockChannel::new("counter", MockWave::Counter { step: 1.0 }),
                MockChannel::new("noise", MockWave::Random { min: -1.0, max: 1.0 }),
            ],
            rate_hz: 50.0,
            record_limit: None,
            corrupt_every: None,
            stop: Arc::new(AtomicBool::new(false)),
            generator: None,
        }
    }

    /// Replace the emitted channel set
    pub fn with_channels(mut self, channels: Vec<MockChannel>) -> Self {
        self.channels = channels;
        self
    }

    /// Set the record emission rate
    pub fn with_rate(mut self, rate_hz: f64) -> Self {
        self.rate_hz = rate_hz;
        self
    }

    /// Stop after emitting this many records and report a closed stream
    pub fn with_record_limit(mut self, limit: u64) -> Self {
        self.record_limit = Some(limit);
        self
    }

    /// Replace every Nth record with one that fails to parse
    pub fn with_corrupt_every(mut self, every: u64) -> Self {
        self.corrupt_every = Some(every.max(1));
        self
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, events: Sender<TransportEvent>) -> Result<()> {
        if self.is_connected() {
            return Err(SerialVisError::Transport(
                "transport is already connected".to_string(),
            ));
        }
        if self.channels.is_empty() {
            return Err(SerialVisError::Config(
                "Mock transport has no channels configured".to_string(),
            ));
        }

        tracing::info!(
            "Mock transport started: {} channels at {} Hz",
            self.channels.len(),
            self.rate_hz
        );

        self.stop.store(false, Ordering::SeqCst);
        let stop = Arc::clone(&self.stop);
        let mut generator = Generator {
            channels: self.channels.clone(),
            interval: Duration::from_secs_f64(1.0 / self.rate_hz.max(0.001)),
            record_limit: self.record_limit,
            corrupt_every: self.corrupt_every,
        };
        self.generator = Some(std::thread::spawn(move || generator.run(events, stop)));
        Ok(())
    }

    fn disconnect(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.generator.take() {
            if handle.join().is_err() {
                tracing::error!("Mock generator thread panicked");
            }
            tracing::info!("Mock transport stopped");
        }
    }

    fn is_connected(&self) -> bool {
        self.generator.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn describe(&self) -> String {
        format!("mock ({} channels @ {} Hz)", self.channels.len(), self.rate_hz)
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// State moved onto the generator thread
struct Generator {
    channels: Vec<MockChannel>,
    interval: Duration,
    record_limit: Option<u64>,
    corrupt_every: Option<u64>,
}

impl Generator {
    fn run(&mut self, events: Sender<TransportEvent>, stop: Arc<AtomicBool>) {
        let start = Instant::now();
        let mut emitted = 0u64;
        let mut carry = String::new();

        loop {
            if stop.load(Ordering::SeqCst) {
                return;
            }
            if self.record_limit.is_some_and(|limit| emitted >= limit) {
                if !carry.is_empty() {
                    let _ = events.send(TransportEvent::Chunk(std::mem::take(&mut carry)));
                }
                let _ = events.send(TransportEvent::Closed { reason: None });
                return;
            }

            emitted += 1;
            carry.push_str(&self.next_record(start.elapsed().as_secs_f64(), emitted));

            // Flush in randomly sized chunks, occasionally holding bytes back
            // so record boundaries rarely line up with chunk boundaries
            while carry.len() > 24 || (!carry.is_empty() && rand_simple() < 0.7) {
                let chunk: String = carry.drain(..chunk_cut(&carry)).collect();
                if events.send(TransportEvent::Chunk(chunk)).is_err() {
                    // Receiver gone; the session is shutting down
                    return;
                }
            }

            if sleep_with_stop(self.interval, &stop) {
                return;
            }
        }
    }

    fn next_record(&mut self, elapsed_secs: f64, emitted: u64) -> String {
        if self.corrupt_every.is_some_and(|every| emitted % every == 0) {
            return "@corrupt@\n".to_string();
        }
        let mut map = serde_json::Map::new();
        for channel in &mut self.channels {
            let value = channel.generate_value(elapsed_secs);
            map.insert(channel.name.clone(), serde_json::Value::from(value));
        }
        let mut line = serde_json::Value::Object(map).to_string();
        line.push('\n');
        line
    }
}

/// Pick a random split position that lands on a char boundary
fn chunk_cut(carry: &str) -> usize {
    let mut cut = 1 + (rand_simple() * (carry.len().saturating_sub(1)) as f64) as usize;
    while cut < carry.len() && !carry.is_char_boundary(cut) {
        cut += 1;
    }
    cut.min(carry.len())
}

/// Sleep in short slices so a stop request is honored promptly
///
/// Returns true if the stop flag was raised during the sleep.
fn sleep_with_stop(duration: Duration, stop: &AtomicBool) -> bool {
    const SLICE: Duration = Duration::from_millis(20);
    let deadline = Instant::now() + duration;
    loop {
        if stop.load(Ordering::SeqCst) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep((deadline - now).min(SLICE));
    }
}
