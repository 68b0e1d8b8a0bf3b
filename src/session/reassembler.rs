//! Chunk-to-record framing
//!
//! Serial transports deliver text in arbitrary slices: a chunk may contain
//! several records, a fraction of one, or cut a multi-character delimiter in
//! half. [`RecordReassembler`] buffers the pending fragment between pushes so
//! the emitted record sequence depends only on the concatenated stream, never
//! on where the chunk boundaries happened to fall.

/// Reassembles delimiter-framed records from a stream of text chunks
#[derive(Debug, Clone)]
pub struct RecordReassembler {
    /// Record delimiter; empty means every chunk is one complete record
    delimiter: String,
    /// Unterminated fragment carried over from previous pushes
    buffer: String,
}

impl RecordReassembler {
    /// Create a reassembler for the given delimiter
    ///
    /// The delimiter may be multiple characters (e.g. `"\r\n"`). An empty
    /// delimiter selects immediate mode, where every pushed chunk is emitted
    /// as-is as one record.
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
            buffer: String::new(),
        }
    }

    /// Get the configured delimiter
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Inspect the unterminated fragment held in the buffer
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Feed one chunk and collect every record it completes
    ///
    /// All pieces before the final delimiter are returned in order; whatever
    /// follows the last delimiter stays buffered until a later push or
    /// [`finish`](Self::finish) completes it. Consecutive delimiters produce
    /// empty records.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        if self.delimiter.is_empty() {
            // Immediate mode: the chunk boundary IS the framing
            return vec![chunk.to_string()];
        }

        self.buffer.push_str(chunk);

        let mut records = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buffer[start..].find(&self.delimiter) {
            let end = start + pos;
            records.push(self.buffer[start..end].to_string());
            start = end + self.delimiter.len();
        }
        if start > 0 {
            self.buffer.drain(..start);
        }
        records
    }

    /// Signal end of stream, flushing a non-empty trailing fragment
    ///
    /// The buffer is never flushed implicitly; only this call hands out an
    /// unterminated final record.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    /// Drop any pending fragment
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
