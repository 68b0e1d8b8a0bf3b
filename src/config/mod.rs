//! Configuration module for SerialVis-RS
//!
//! This module handles engine configuration including:
//! - Serial port settings (port, baud rate, framing)
//! - Session settings (record delimiter, publish throttle)
//! - Export settings (CSV destination)
//! - Profile files persisted as TOML
//!
//! # Profile Location
//!
//! The default profile is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/serialvis-rs/profile.toml`
//! - **macOS**: `~/Library/Application Support/serialvis-rs/profile.toml`
//! - **Windows**: `%APPDATA%\serialvis-rs\profile.toml`
//!
//! # Example
//!
//! ```ignore
//! use serialvis_rs::config::SessionProfile;
//!
//! let mut profile = SessionProfile::load_or_default("bench.toml");
//! profile.serial.port = "/dev/ttyUSB0".to_string();
//! profile.save("bench.toml")?;
//! ```

use crate::error::{Result, SerialVisError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "serialvis-rs";

/// Default profile filename
pub const PROFILE_FILE: &str = "profile.toml";

/// Default record delimiter
pub const DEFAULT_DELIMITER: &str = "\n";

/// Default snapshot publish interval in milliseconds
pub const DEFAULT_PUBLISH_INTERVAL_MS: u64 = 250;

/// Default baud rate for serial connections
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default capacity of the transport chunk channel
pub const DEFAULT_CHUNK_CHANNEL_CAPACITY: usize = 1024;

/// Default interval between ingest-stats events in milliseconds
pub const DEFAULT_STATS_INTERVAL_MS: u64 = 500;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        SerialVisError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            SerialVisError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the default profile file
pub fn default_profile_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(PROFILE_FILE))
}

// ==================== Serial Config ====================

/// Serial port connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Port path (e.g., "/dev/ttyUSB0" or "COM3")
    #[serde(default)]
    pub port: String,

    /// Baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Data bits per character (5-8)
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,

    /// Stop bits (1 or 2)
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,

    /// Parity checking mode
    #[serde(default)]
    pub parity: ParityMode,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_data_bits() -> u8 {
    8
}

fn default_stop_bits() -> u8 {
    1
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            stop_bits: 1,
            parity: ParityMode::default(),
        }
    }
}

impl SerialConfig {
    /// Check that the configuration can be used to open a port
    pub fn validate(&self) -> Result<()> {
        if self.port.is_empty() {
            return Err(SerialVisError::Config(
                "No serial port configured".to_string(),
            ));
        }
        if !(5..=8).contains(&self.data_bits) {
            return Err(SerialVisError::Config(format!(
                "Invalid data bits: {} (expected 5-8)",
                self.data_bits
            )));
        }
        if !(1..=2).contains(&self.stop_bits) {
            return Err(SerialVisError::Config(format!(
                "Invalid stop bits: {} (expected 1 or 2)",
                self.stop_bits
            )));
        }
        Ok(())
    }
}

/// Parity checking mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ParityMode {
    /// No parity bit
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

impl std::fmt::Display for ParityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParityMode::None => write!(f, "None"),
            ParityMode::Odd => write!(f, "Odd"),
            ParityMode::Even => write!(f, "Even"),
        }
    }
}

// ==================== Session Config ====================

/// Ingestion and publication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Record delimiter; an empty string treats every chunk as one record
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Minimum interval between live snapshot publications in milliseconds
    #[serde(default = "default_publish_interval_ms")]
    pub publish_interval_ms: u64,

    /// Capacity of the transport chunk channel
    #[serde(default = "default_chunk_channel_capacity")]
    pub chunk_channel_capacity: usize,

    /// Interval between ingest-stats events in milliseconds
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

fn default_publish_interval_ms() -> u64 {
    DEFAULT_PUBLISH_INTERVAL_MS
}

fn default_chunk_channel_capacity() -> usize {
    DEFAULT_CHUNK_CHANNEL_CAPACITY
}

fn default_stats_interval_ms() -> u64 {
    DEFAULT_STATS_INTERVAL_MS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            publish_interval_ms: DEFAULT_PUBLISH_INTERVAL_MS,
            chunk_channel_capacity: DEFAULT_CHUNK_CHANNEL_CAPACITY,
            stats_interval_ms: DEFAULT_STATS_INTERVAL_MS,
        }
    }
}

impl SessionConfig {
    /// Publish throttle interval as a Duration
    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }

    /// Stats emission interval as a Duration
    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }
}

// ==================== Export Config ====================

/// Export destinations for the binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Where to write the CSV export; None picks a timestamped filename
    #[serde(default)]
    pub csv_path: Option<PathBuf>,
}

// ==================== Session Profile ====================

/// Profile file bundling everything needed to run a capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProfile {
    /// Profile format version for future compatibility
    #[serde(default = "default_profile_version")]
    pub version: u32,

    /// Profile name
    #[serde(default)]
    pub name: String,

    /// When the profile was created
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,

    /// Serial port settings
    #[serde(default)]
    pub serial: SerialConfig,

    /// Ingestion and publication settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Export destinations
    #[serde(default)]
    pub export: ExportConfig,
}

fn default_profile_version() -> u32 {
    1
}

impl Default for SessionProfile {
    fn default() -> Self {
        Self {
            version: 1,
            name: "Untitled Session".to_string(),
            created: Utc::now(),
            serial: SerialConfig::default(),
            session: SessionConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl SessionProfile {
    /// Create a new profile with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load a profile from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        toml::from_str(&content).map_err(|e| {
            SerialVisError::Config(format!("Failed to parse profile {:?}: {}", path, e))
        })
    }

    /// Load a profile, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load profile, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the profile to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            SerialVisError::Config(format!("Failed to serialize profile: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }
}

// ==================== Tests ====================
