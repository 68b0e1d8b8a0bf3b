//! Raw record log and per-channel series storage
//!
//! The [`RawRecordLog`] retains every delivered record verbatim, parseable or
//! not, and is the single source of truth: recompute and export replay it
//! from scratch rather than trusting the live series. The [`SeriesStore`]
//! holds the live per-channel sample vectors that throttled snapshots are
//! built from.

use crate::types::Sample;

/// Append-only log of verbatim record texts
#[derive(Debug, Clone, Default)]
pub struct RawRecordLog {
    records: Vec<String>,
}

impl RawRecordLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record verbatim, returning its assigned index
    pub fn push(&mut self, record: String) -> u64 {
        let index = self.records.len() as u64;
        self.records.push(record);
        index
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the record text at an index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.records.get(index).map(String::as_str)
    }

    /// Iterate the records in ingest order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(String::as_str)
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Live per-channel sample vectors, indexed by registry index
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    series: Vec<Vec<Sample>>,
}

impl SeriesStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the store so `index` is a valid channel
    pub fn ensure_channel(&mut self, index: usize) {
        if index >= self.series.len() {
            self.series.resize_with(index + 1, Vec::new);
        }
    }

    /// Append a sample to a channel's series
    ///
    /// Callers derive `sample.index` from the raw-log position of the
    /// record, so within one channel indices are strictly increasing and
    /// each occurs at most once.
    pub fn append(&mut self, channel: usize, sample: Sample) {
        self.ensure_channel(channel);
        let series = &mut self.series[channel];
        debug_assert!(
            series.last().map_or(true, |last| last.index < sample.index),
            "sample indices must be strictly increasing within a channel"
        );
        series.push(sample);
    }

    /// Get a channel's samples (empty slice for unknown channels)
    pub fn channel(&self, index: usize) -> &[Sample] {
        self.series.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of channels with allocated series
    pub fn channel_count(&self) -> usize {
        self.series.len()
    }

    /// Total number of samples across all channels
    pub fn sample_count(&self) -> usize {
        self.series.iter().map(Vec::len).sum()
    }

    /// Drop every series
    pub fn clear(&mut self) {
        self.series.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_assigns_sequential_indices() {
        let mut log = RawRecordLog::new();
        assert_eq!(log.push("{\"a\":1}".to_string()), 0);
        assert_eq!(log.push("not json".to_string()), 1);
        assert_eq!(log.push("{\"b\":2}".to_string()), 2);

        assert_eq!(log.len(), 3);
        assert_eq!(log.get(1), Some("not json"));
        assert_eq!(log.get(3), None);
    }

    #[test]
    fn test_log_retains_verbatim_text() {
        let mut log = RawRecordLog::new();
        log.push("  {\"a\":1}\r".to_string());
        assert_eq!(log.get(0), Some("  {\"a\":1}\r"));
    }

    #[test]
    fn test_log_iter_order() {
        let mut log = RawRecordLog::new();
        log.push("first".to_string());
        log.push("second".to_string());
        let records: Vec<&str> = log.iter().collect();
        assert_eq!(records, vec!["first", "second"]);
    }

    #[test]
    fn test_log_clear() {
        let mut log = RawRecordLog::new();
        log.push("a".to_string());
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.push("b".to_string()), 0);
    }

    #[test]
    fn test_store_grows_on_append() {
        let mut store = SeriesStore::new();
        store.append(2, Sample::new(0, 1.0));
        assert_eq!(store.channel_count(), 3);
        assert!(store.channel(0).is_empty());
        assert_eq!(store.channel(2).len(), 1);
    }

    #[test]
    fn test_store_series_lengths_differ() {
        let mut store = SeriesStore::new();
        store.append(0, Sample::new(0, 1.0));
        store.append(1, Sample::new(0, 2.0));
        store.append(0, Sample::new(1, 3.0));

        assert_eq!(store.channel(0).len(), 2);
        assert_eq!(store.channel(1).len(), 1);
        assert_eq!(store.sample_count(), 3);
    }

    #[test]
    fn test_store_unknown_channel_is_empty() {
        let store = SeriesStore::new();
        assert!(store.channel(9).is_empty());
    }

    #[test]
    fn test_store_clear() {
        let mut store = SeriesStore::new();
        store.append(0, Sample::new(0, 1.0));
        store.clear();
        assert_eq!(store.channel_count(), 0);
        assert_eq!(store.sample_count(), 0);
    }
}
