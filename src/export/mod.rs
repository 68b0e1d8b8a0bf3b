//! Recompute and export engine
//!
//! Everything in this module reads only the raw record log. The live series
//! store may have been feeding a throttled consumer, so the log replay here
//! is the authoritative output: [`recompute`] re-parses every record from
//! index 0 and rebuilds the full-resolution series from scratch.
//!
//! Replay skips malformed records silently; they were diagnosed once at
//! ingest time.

use crate::session::parser;
use crate::session::registry::ChannelRegistry;
use crate::session::store::{RawRecordLog, SeriesStore};
use crate::types::{ChannelSeries, ChannelStats, Sample, SessionSnapshot};

/// Replay the raw log into a full-resolution snapshot
///
/// Channel order is first-appearance order across the whole log, matching
/// what a live registry would have assigned. Replaying an unmodified log is
/// deterministic: repeated calls yield identical snapshots.
pub fn recompute(log: &RawRecordLog) -> SessionSnapshot {
    let mut registry = ChannelRegistry::new();
    let mut series = SeriesStore::new();

    for (index, record) in log.iter().enumerate() {
        let fields = match parser::parse_record(record) {
            Ok(fields) => fields,
            Err(_) => continue,
        };
        for (name, value) in &fields {
            let (channel, newly_created) = registry.ensure(name);
            if newly_created {
                series.ensure_channel(channel);
            }
            series.append(
                channel,
                Sample::new(index as u64, parser::numeric_value(value)),
            );
        }
    }

    let series = registry
        .names()
        .iter()
        .enumerate()
        .map(|(index, name)| ChannelSeries {
            name: name.clone(),
            index,
            points: series.channel(index).to_vec(),
        })
        .collect();

    let snapshot = SessionSnapshot {
        series,
        record_count: log.len() as u64,
    };
    tracing::debug!(
        "Recomputed {} channels from {} records",
        snapshot.channel_count(),
        log.len()
    );
    snapshot
}

/// Render the raw log as CSV rows
///
/// The header is `sample,<channel>,...` in registry order, followed by one
/// row per raw-log entry. A channel absent from a record renders as an empty
/// field, so malformed records become rows carrying only their sample index.
pub fn to_csv(log: &RawRecordLog) -> String {
    let snapshot = recompute(log);

    let mut csv = String::from("sample");
    for series in &snapshot.series {
        csv.push(',');
        csv.push_str(&series.name);
    }
    csv.push('\n');

    // Each series is already sorted by sample index, so one cursor per
    // channel walks the whole export in linear time
    let mut cursors = vec![0usize; snapshot.series.len()];
    for row in 0..snapshot.record_count {
        csv.push_str(&row.to_string());
        for (i, series) in snapshot.series.iter().enumerate() {
            csv.push(',');
            if let Some(sample) = series.points.get(cursors[i]) {
                if sample.index == row {
                    csv.push_str(&sample.value.to_string());
                    cursors[i] += 1;
                }
            }
        }
        csv.push('\n');
    }
    csv
}

/// Compute per-channel statistics from the raw log
pub fn statistics(log: &RawRecordLog) -> Vec<ChannelStats> {
    snapshot_statistics(&recompute(log))
}

/// Compute per-channel statistics from an already-built snapshot
///
/// Only finite samples count; a NaN sample affects neither the mean nor the
/// denominator. The standard deviation is the population form (divide by N),
/// and `rsd_percent` is NaN when the channel has no finite samples or a mean
/// of exactly zero.
pub fn snapshot_statistics(snapshot: &SessionSnapshot) -> Vec<ChannelStats> {
    snapshot
        .series
        .iter()
        .map(|series| channel_stats(&series.name, &series.points))
        .collect()
}

fn channel_stats(name: &str, points: &[Sample]) -> ChannelStats {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for sample in points {
        if sample.value.is_finite() {
            count += 1;
            sum += sample.value;
            min = min.min(sample.value);
            max = max.max(sample.value);
        }
    }

    if count == 0 {
        return ChannelStats {
            name: name.to_string(),
            count: 0,
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            std_dev: f64::NAN,
            rsd_percent: f64::NAN,
        };
    }

    let mean = sum / count as f64;
    let variance = points
        .iter()
        .filter(|s| s.value.is_finite())
        .map(|s| {
            let d = s.value - mean;
            d * d
        })
        .sum::<f64>()
        / count as f64;
    let std_dev = variance.sqrt();
    let rsd_percent = if mean == 0.0 {
        f64::NAN
    } else {
        std_dev / mean * 100.0
    };

    ChannelStats {
        name: name.to_string(),
        count,
        min,
        max,
        mean,
        std_dev,
        rsd_percent,
    }
}
