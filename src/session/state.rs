//! Owned session state
//!
//! One [`SessionState`] holds everything a capture session accumulates: the
//! verbatim raw record log, the channel registry, the live series store, and
//! ingest counters. It is a plain owned value with no interior locking;
//! exclusive operations like [`clear`](SessionState::clear) take `&mut self`
//! and therefore cannot overlap reads. Several independent sessions can
//! coexist in one process.

use crate::session::parser;
use crate::session::registry::ChannelRegistry;
use crate::session::store::{RawRecordLog, SeriesStore};
use crate::types::{ChannelSeries, ConnectionStatus, IngestStats, Sample, SessionSnapshot};

/// Outcome of ingesting one record
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// The record parsed as a channel object
    Parsed {
        /// Raw-log index assigned to the record
        index: u64,
        /// Channels seen for the first time, in appearance order
        new_channels: Vec<(usize, String)>,
    },
    /// The record was malformed; it is still retained in the raw log
    Rejected {
        /// Raw-log index assigned to the record
        index: u64,
        /// Decode failure description
        message: String,
    },
}

/// All state for one capture session
#[derive(Debug, Default)]
pub struct SessionState {
    log: RawRecordLog,
    registry: ChannelRegistry,
    series: SeriesStore,
    stats: IngestStats,
    status: ConnectionStatus,
}

impl SessionState {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one reassembled record
    ///
    /// The record text is appended to the raw log verbatim whether or not it
    /// parses. A parsed record registers any new channel names and appends
    /// one sample per field, keyed by the record's log index; a malformed
    /// record is diagnosed once and skipped for aggregation. Records must be
    /// fed strictly in arrival order.
    pub fn ingest_record(&mut self, record: String) -> IngestOutcome {
        let parse_result = parser::parse_record(&record);
        let index = self.log.push(record);
        self.stats.records_ingested += 1;

        match parse_result {
            Ok(fields) => {
                let mut new_channels = Vec::new();
                for (name, value) in &fields {
                    let (channel, newly_created) = self.registry.ensure(name);
                    if newly_created {
                        self.series.ensure_channel(channel);
                        new_channels.push((channel, name.clone()));
                    }
                    self.series
                        .append(channel, Sample::new(index, parser::numeric_value(value)));
                    self.stats.samples_appended += 1;
                }
                self.stats.records_parsed += 1;
                IngestOutcome::Parsed {
                    index,
                    new_channels,
                }
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!("Rejected record {}: {}", index, message);
                self.stats.records_rejected += 1;
                IngestOutcome::Rejected { index, message }
            }
        }
    }

    /// Build a live snapshot of every channel series, in registry order
    pub fn snapshot(&self) -> SessionSnapshot {
        let series = self
            .registry
            .names()
            .iter()
            .enumerate()
            .map(|(index, name)| ChannelSeries {
                name: name.clone(),
                index,
                points: self.series.channel(index).to_vec(),
            })
            .collect();

        SessionSnapshot {
            series,
            record_count: self.log.len() as u64,
        }
    }

    /// Reset log, registry, series, and counters in one exclusive operation
    ///
    /// Connection status is unaffected; clearing data does not disconnect.
    pub fn clear(&mut self) {
        self.log.clear();
        self.registry.clear();
        self.series.clear();
        self.stats.reset();
        tracing::info!("Session data cleared");
    }

    /// The retained raw record log
    pub fn log(&self) -> &RawRecordLog {
        &self.log
    }

    /// Number of records in the raw log
    pub fn record_count(&self) -> usize {
        self.log.len()
    }

    /// Channel names in registry (first-appearance) order
    pub fn channel_names(&self) -> &[String] {
        self.registry.names()
    }

    /// Number of registered channels
    pub fn channel_count(&self) -> usize {
        self.registry.len()
    }

    /// Ingest counters
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Mutable ingest counters, for transport-level accounting
    pub fn stats_mut(&mut self) -> &mut IngestStats {
        &mut self.stats
    }

    /// Current connection status
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Update the connection status
    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
    }
}
