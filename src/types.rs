//! Core data types for SerialVis-RS
//!
//! This module contains the fundamental data structures used throughout
//! the engine for representing channels, samples, and session snapshots.
//!
//! # Main Types
//!
//! - [`Sample`] - A single value keyed by the raw-log index of its record
//! - [`ChannelSeries`] - An ordered series of samples for one named channel
//! - [`SessionSnapshot`] - All channel series at a point in time, in
//!   first-appearance order
//! - [`ChannelStats`] - Summary statistics for one channel
//! - [`IngestStats`] - Counters describing ingestion health
//!
//! # NaN samples
//!
//! A sample value of `f64::NAN` marks a field that was present in a record
//! but not numeric. NaN samples are excluded from statistics and break line
//! continuity when the points are handed to a plot.

use serde::{Deserialize, Serialize};

/// A single sample with the raw-log index of the record it came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Position of the originating record in the raw record log
    pub index: u64,
    /// The numeric value (NaN for non-numeric fields)
    pub value: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(index: u64, value: f64) -> Self {
        Self { index, value }
    }

    /// Check if this sample is a gap (non-numeric field value)
    pub fn is_gap(&self) -> bool {
        self.value.is_nan()
    }

    /// Get the sample as an `[x, y]` plot point
    pub fn as_plot_point(&self) -> [f64; 2] {
        [self.index as f64, self.value]
    }
}

/// Ordered sample series for one named channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSeries {
    /// Channel name as it appeared in the records
    pub name: String,
    /// Dense registry index (first-appearance order)
    pub index: usize,
    /// Samples in strictly increasing raw-log order
    pub points: Vec<Sample>,
}

impl ChannelSeries {
    /// Create an empty series for a channel
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            points: Vec::new(),
        }
    }

    /// Get samples as plot points (raw-log index, value)
    pub fn as_plot_points(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(Sample::as_plot_point).collect()
    }

    /// Get the value range over the finite samples of the series
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        let mut any = false;
        for sample in &self.points {
            if sample.value.is_finite() {
                min = min.min(sample.value);
                max = max.max(sample.value);
                any = true;
            }
        }
        if any {
            Some((min, max))
        } else {
            None
        }
    }

    /// Get the most recent sample
    pub fn last(&self) -> Option<&Sample> {
        self.points.last()
    }
}

/// All channel series at a point in time
///
/// Series appear in registry (first-appearance) order. `record_count` is
/// the raw-log length at the time the snapshot was taken, which is also
/// one past the highest sample index any series can contain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// One series per channel, in registry order
    pub series: Vec<ChannelSeries>,
    /// Raw-log length when the snapshot was taken
    pub record_count: u64,
}

impl SessionSnapshot {
    /// Look up a series by channel name
    pub fn channel(&self, name: &str) -> Option<&ChannelSeries> {
        self.series.iter().find(|s| s.name == name)
    }

    /// Number of channels in the snapshot
    pub fn channel_count(&self) -> usize {
        self.series.len()
    }

    /// Total number of samples across all channels
    pub fn sample_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    /// Check if the snapshot holds no data at all
    pub fn is_empty(&self) -> bool {
        self.record_count == 0 && self.series.is_empty()
    }
}

/// Summary statistics for one channel
///
/// All values are computed over the finite samples only; NaN samples are
/// excluded. With zero finite samples every statistic is NaN. The standard
/// deviation is the population form (divide by N), and `rsd_percent` is
/// `std_dev / mean * 100`, defined as NaN when the mean is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStats {
    /// Channel name
    pub name: String,
    /// Number of finite samples
    pub count: usize,
    /// Minimum finite value
    pub min: f64,
    /// Maximum finite value
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Relative standard deviation in percent
    pub rsd_percent: f64,
}

/// Represents the connection status to the serial device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Not connected to any device
    #[default]
    Disconnected,
    /// Attempting to open the port
    Connecting,
    /// Connected and streaming
    Connected,
    /// Connection error occurred
    Error,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting..."),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Error => write!(f, "Error"),
        }
    }
}

/// Statistics about the ingestion stream
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    /// Number of raw chunks received from the transport
    pub chunks_received: u64,
    /// Total bytes received from the transport
    pub bytes_received: u64,
    /// Number of records appended to the raw log (parsed or not)
    pub records_ingested: u64,
    /// Number of records that parsed as channel objects
    pub records_parsed: u64,
    /// Number of records rejected as malformed
    pub records_rejected: u64,
    /// Number of samples appended across all channels
    pub samples_appended: u64,
    /// Number of snapshots actually published
    pub snapshots_published: u64,
    /// Number of publish requests coalesced into a pending one
    pub requests_coalesced: u64,
    /// Number of events dropped due to a full event queue
    pub dropped_events: u64,
}

impl IngestStats {
    /// Calculate the parse success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.records_ingested == 0 {
            100.0
        } else {
            (self.records_parsed as f64 / self.records_ingested as f64) * 100.0
        }
    }

    /// Reset all counters
    pub fn reset(&mut self) {
        *self = IngestStats::default();
    }
}
