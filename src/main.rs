//! SerialVis-RS - Main Entry Point
//!
//! Headless capture binary: opens the configured stream, ingests until the
//! device closes it (or a duration limit expires), then writes the CSV
//! export and prints per-channel statistics.
//!
//! # Usage
//!
//! ```bash
//! # Ingest from the profile's serial port until the stream closes
//! serialvis
//!
//! # Ingest from a specific port for 30 seconds
//! serialvis --port /dev/ttyUSB0 --baud 921600 --duration 30
//!
//! # Exercise the pipeline without hardware
//! cargo run --features mock-transport -- --mock --duration 5
//! ```

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use serialvis_rs::config::{self, SessionProfile};
use serialvis_rs::session::{SessionEvent, SessionHandle, SessionRunner};
use serialvis_rs::transport::{SerialTransport, Transport};
use serialvis_rs::types::{ChannelStats, ConnectionStatus, IngestStats, SessionSnapshot};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Serial stream ingestion and time-series aggregation engine
#[derive(Parser, Debug)]
#[command(name = "serialvis")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the session profile (TOML)
    #[arg(short = 'c', long)]
    profile: Option<PathBuf>,

    /// Serial port override (e.g. /dev/ttyUSB0 or COM3)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate override
    #[arg(short, long)]
    baud: Option<u32>,

    /// Disconnect after this many seconds (default: run until the stream closes)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Write the final CSV export to this path
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Also write logs to daily-rotated files in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Stream from the built-in mock device instead of a serial port
    #[cfg(feature = "mock-transport")]
    #[arg(long)]
    mock: bool,
}

/// What the capture loop saw before the stream ended
#[derive(Default)]
struct RunOutcome {
    /// Authoritative snapshot recomputed from the raw record log at stream end
    final_snapshot: Option<SessionSnapshot>,
    /// Last ingest counters the session reported
    stats: Option<IngestStats>,
    /// Error that ended the stream, if any
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list_ports {
        return list_ports();
    }

    let _log_guard = init_logging(cli.log_dir.as_deref())?;
    tracing::info!("Starting SerialVis engine");

    let profile = load_profile(&cli);
    let transport = build_transport(&cli, &profile);
    tracing::info!("Using transport: {}", transport.describe());

    let (runner, handle) = SessionRunner::new(profile.session.clone(), transport);
    let session_thread = std::thread::spawn(move || runner.run());

    handle.connect();
    let outcome = ingest_until_closed(&handle, cli.duration.map(Duration::from_secs));

    // Final exports are computed by the session from its raw record log
    handle.export_csv();
    handle.request_statistics();
    let (csv, statistics) = collect_exports(&handle);

    handle.shutdown();
    let _ = session_thread.join();

    report(&cli, &profile, outcome, csv, statistics)
}

fn load_profile(cli: &Cli) -> SessionProfile {
    let path = cli.profile.clone().or_else(config::default_profile_path);
    match path {
        Some(path) => {
            let profile = SessionProfile::load_or_default(&path);
            if path.exists() {
                tracing::info!("Loaded profile from {:?}", path);
            }
            profile
        }
        None => SessionProfile::default(),
    }
}

fn build_transport(cli: &Cli, profile: &SessionProfile) -> Box<dyn Transport> {
    #[cfg(feature = "mock-transport")]
    if cli.mock {
        return Box::new(serialvis_rs::transport::MockTransport::new());
    }

    let mut serial = profile.serial.clone();
    if let Some(port) = &cli.port {
        serial.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        serial.baud_rate = baud;
    }
    Box::new(SerialTransport::new(serial))
}

/// Pump session events until the stream ends
///
/// Returns once the session reports a terminal status. When a duration limit
/// is set, sends a single disconnect after it expires and keeps pumping so
/// the final recompute and stats still arrive.
fn ingest_until_closed(handle: &SessionHandle, limit: Option<Duration>) -> RunOutcome {
    let started = Instant::now();
    let mut disconnect_sent = false;
    let mut outcome = RunOutcome::default();

    loop {
        if let Some(limit) = limit {
            if !disconnect_sent && started.elapsed() >= limit {
                tracing::info!("Run duration reached, disconnecting");
                handle.disconnect();
                disconnect_sent = true;
            }
        }

        match handle.receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(SessionEvent::Status(ConnectionStatus::Disconnected)) => break,
            Ok(SessionEvent::Status(ConnectionStatus::Error)) => break,
            Ok(SessionEvent::Status(status)) => {
                tracing::debug!("Status: {}", status);
            }
            Ok(SessionEvent::ConnectionError(message)) => {
                tracing::error!("Connection error: {}", message);
                outcome.error = Some(message);
            }
            Ok(SessionEvent::ChannelDiscovered { index, name }) => {
                tracing::info!("Discovered channel '{}' (#{})", name, index);
            }
            Ok(SessionEvent::RecordRejected {
                sample_index,
                message,
            }) => {
                tracing::debug!("Rejected record {}: {}", sample_index, message);
            }
            Ok(SessionEvent::Snapshot(snapshot)) => {
                tracing::debug!(
                    "Snapshot: {} channels, {} records",
                    snapshot.channel_count(),
                    snapshot.record_count
                );
            }
            Ok(SessionEvent::Recomputed(snapshot)) => {
                outcome.final_snapshot = Some(snapshot);
            }
            Ok(SessionEvent::Stats(stats)) => {
                outcome.stats = Some(stats);
            }
            Ok(SessionEvent::Shutdown) => break,
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    outcome
}

/// Wait for the CSV and statistics replies to the final export commands
fn collect_exports(handle: &SessionHandle) -> (Option<String>, Option<Vec<ChannelStats>>) {
    let mut csv = None;
    let mut statistics = None;
    let deadline = Instant::now() + Duration::from_secs(5);

    while (csv.is_none() || statistics.is_none()) && Instant::now() < deadline {
        match handle.receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(SessionEvent::Csv(text)) => csv = Some(text),
            Ok(SessionEvent::Statistics(stats)) => statistics = Some(stats),
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    (csv, statistics)
}

fn report(
    cli: &Cli,
    profile: &SessionProfile,
    outcome: RunOutcome,
    csv: Option<String>,
    statistics: Option<Vec<ChannelStats>>,
) -> anyhow::Result<()> {
    let record_count = outcome
        .final_snapshot
        .as_ref()
        .map_or(0, |snapshot| snapshot.record_count);

    if record_count == 0 {
        tracing::info!("No records ingested, skipping CSV export");
    } else if let Some(csv) = csv {
        let path = cli
            .csv
            .clone()
            .or_else(|| profile.export.csv_path.clone())
            .unwrap_or_else(default_csv_path);
        std::fs::write(&path, csv)
            .with_context(|| format!("Failed to write CSV to {:?}", path))?;
        tracing::info!("Wrote {} records to {:?}", record_count, path);
    }

    if let Some(statistics) = statistics {
        print_statistics(&statistics);
    }
    if let Some(stats) = outcome.stats {
        print_ingest_summary(&stats);
    }

    if let Some(message) = outcome.error {
        if record_count == 0 {
            anyhow::bail!(message);
        }
        tracing::warn!("Session ended with an error: {}", message);
    }

    Ok(())
}

fn default_csv_path() -> PathBuf {
    PathBuf::from(format!(
        "serialvis-{}.csv",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ))
}

fn print_statistics(statistics: &[ChannelStats]) {
    if statistics.is_empty() {
        return;
    }
    println!();
    println!(
        "{:<20} {:>8} {:>12} {:>12} {:>12} {:>12} {:>9}",
        "channel", "count", "min", "max", "mean", "stdev", "rsd %"
    );
    for s in statistics {
        println!(
            "{:<20} {:>8} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>9.2}",
            s.name, s.count, s.min, s.max, s.mean, s.std_dev, s.rsd_percent
        );
    }
}

fn print_ingest_summary(stats: &IngestStats) {
    println!();
    println!(
        "{} chunks, {} bytes, {} records ({} parsed, {} rejected, {:.1}% ok)",
        stats.chunks_received,
        stats.bytes_received,
        stats.records_ingested,
        stats.records_parsed,
        stats.records_rejected,
        stats.success_rate()
    );
    println!(
        "{} samples appended, {} snapshots published, {} requests coalesced, {} events dropped",
        stats.samples_appended,
        stats.snapshots_published,
        stats.requests_coalesced,
        stats.dropped_events
    );
}

fn list_ports() -> anyhow::Result<()> {
    let ports = serialport::available_ports().context("Failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }
    for port in ports {
        println!("{}", port.port_name);
    }
    Ok(())
}

fn init_logging(
    log_dir: Option<&Path>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,serialvis_rs=debug"));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {:?}", dir))?;
            let appender = tracing_appender::rolling::daily(dir, "serialvis.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            registry.init();
            Ok(None)
        }
    }
}
