//! Error handling for the SerialVis-RS engine
//!
//! This module defines custom error types and a Result alias for use
//! throughout the crate.

use thiserror::Error;

/// Main error type for SerialVis-RS operations
#[derive(Error, Debug)]
pub enum SerialVisError {
    /// Errors coming from the serial port layer
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Errors related to transport lifecycle (connect/disconnect)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Errors related to decoding a single record
    #[error("Malformed record: {0}")]
    Record(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SerialVisError>,
    },
}

impl SerialVisError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SerialVisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for SerialVis-RS operations
pub type Result<T> = std::result::Result<T, SerialVisError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, serialport::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SerialVisError::Serial(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| SerialVisError::Serial(e).with_context(f()))
    }
}
