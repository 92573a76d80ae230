//! Linklab - control-link codec lab
//!
//! Runs a panel of wire codecs against a shared bitrate-limited link and
//! reports per-codec latency and reconstruction error. Batch mode runs as
//! fast as possible and prints whole-run statistics; realtime mode paces
//! the link against the wall clock and logs rolling statistics once per
//! second.

mod config;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::Receiver;
use linklab_core::sim::SharedListener;
use linklab_core::{
    calculate, ChannelListener, Collector, InstantClock, LinkPacket, PacketListener,
    RealtimeClock, RollingStatsCollector, Setup, SineSource, Stats,
};
use tracing::info;

use crate::config::RunConfig;

/// Trailing window for realtime rolling statistics (µs)
const ROLLING_WINDOW_US: u64 = 1_000_000;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("linklab=info".parse().unwrap()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut realtime = false;
    let mut json_report = false;
    let mut bitrate: Option<u64> = None;
    let mut duration_s: Option<u64> = None;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--version" | "-v" => {
                println!("linklab {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--realtime" | "-r" => {
                realtime = true;
            }
            "--json" | "-j" => {
                json_report = true;
            }
            "--config" | "-c" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    return Ok(());
                }
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
                continue;
            }
            "--bitrate" | "-b" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --bitrate requires a value");
                    return Ok(());
                }
                bitrate = args[i + 1].parse().ok();
                if bitrate.is_none() {
                    eprintln!("Error: Invalid bitrate: {}", args[i + 1]);
                    return Ok(());
                }
                i += 2;
                continue;
            }
            "--duration" | "-d" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --duration requires a value in seconds");
                    return Ok(());
                }
                duration_s = args[i + 1].parse().ok();
                if duration_s.is_none() {
                    eprintln!("Error: Invalid duration: {}", args[i + 1]);
                    return Ok(());
                }
                i += 2;
                continue;
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                return Ok(());
            }
        }
        i += 1;
    }

    let mut config = config_path
        .map(|path| RunConfig::load(&path))
        .unwrap_or_default();
    if let Some(bitrate) = bitrate {
        config.bitrate = bitrate;
    }
    if let Some(seconds) = duration_s {
        config.duration_us = Some(seconds * 1_000_000);
    }

    if realtime {
        run_realtime(config)
    } else {
        run_batch(config, json_report)
    }
}

fn print_help() {
    println!("Usage: linklab [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config PATH    Load run configuration from a JSON file");
    println!("  -r, --realtime       Pace the link against the wall clock");
    println!("  -b, --bitrate BITS   Link capacity in bits per second (default: 20000)");
    println!("  -d, --duration SECS  Run length in seconds");
    println!("  -j, --json           Print batch results as JSON lines");
    println!("  -v, --version        Show version");
    println!("  -h, --help           Show this help");
    println!();
    println!("Examples:");
    println!("  linklab -d 3");
    println!("  linklab -c run.json --realtime");
}

/// Deterministic batch run: instant clock, whole-capture statistics
fn run_batch(config: RunConfig, json_report: bool) -> Result<()> {
    let duration = config
        .duration_us
        .context("batch runs need a duration; use --realtime for an unbounded run")?;

    let codecs = config.build_codecs();
    let labels: Vec<String> = codecs.iter().map(|codec| codec.label()).collect();
    let collector = Arc::new(Mutex::new(Collector::new()));

    let mut setup = Setup::new(
        Box::new(SineSource::new(config.sine_frequency, config.channels)),
        codecs,
    );
    setup.bitrate = config.bitrate;
    setup.duration = Some(duration);
    setup.time_service = Box::new(InstantClock);
    let listener: SharedListener = collector.clone();
    setup.listeners.push(listener);

    setup.run()?;

    let collector = collector
        .lock()
        .map_err(|_| anyhow!("packet collector poisoned"))?;
    for (codec_id, label) in labels.iter().enumerate() {
        let Some(packets) = collector.packets(codec_id) else {
            continue;
        };
        let capture: Vec<LinkPacket> = packets.iter().cloned().collect();
        let stats = calculate(&capture)?;
        report(label, &stats, json_report)?;
    }
    Ok(())
}

fn report(label: &str, stats: &Stats, json_report: bool) -> Result<()> {
    if json_report {
        let line = serde_json::json!({ "codec": label, "stats": stats });
        println!("{line}");
    } else {
        info!(
            codec = %label,
            packets = stats.total_packets,
            latency_mean_us = stats.latency.mean,
            latency_max_us = stats.latency.max,
            error_mean = %format!("{:.6}", stats.channel_error.mean),
            error_max = %format!("{:.6}", stats.channel_error.max),
            "codec results"
        );
    }
    Ok(())
}

/// Wall-clock paced run: simulation on a worker thread, rolling stats here
fn run_realtime(config: RunConfig) -> Result<()> {
    let codecs = config.build_codecs();
    let labels: Vec<String> = codecs.iter().map(|codec| codec.label()).collect();
    let (listener, receiver) = ChannelListener::new();

    let mut setup = Setup::new(
        Box::new(SineSource::new(config.sine_frequency, config.channels)),
        codecs,
    );
    setup.bitrate = config.bitrate;
    setup.duration = config.duration_us;
    setup.time_service = Box::new(RealtimeClock::new());
    setup.listeners.push(Arc::new(Mutex::new(listener)));

    let worker = thread::spawn(move || setup.run());
    consume_packets(receiver, &labels);
    worker
        .join()
        .map_err(|_| anyhow!("simulation thread panicked"))??;
    Ok(())
}

/// Drain forwarded packets, logging each codec's rolling window once per second
fn consume_packets(receiver: Receiver<(usize, LinkPacket)>, labels: &[String]) {
    let mut rolling = RollingStatsCollector::new(ROLLING_WINDOW_US);
    let mut last_report = 0u64;

    for (codec_id, packet) in receiver.iter() {
        let rx_ts = packet.rx_ts;
        rolling.on_packet(codec_id, &packet);

        if rx_ts.saturating_sub(last_report) >= ROLLING_WINDOW_US {
            last_report = rx_ts;
            for (id, label) in labels.iter().enumerate() {
                if let Ok(stats) = rolling.stats(id) {
                    info!(
                        codec = %label,
                        window_packets = stats.total_packets,
                        latency_mean_us = stats.latency.mean,
                        latency_max_us = stats.latency.max,
                        error_mean = %format!("{:.6}", stats.channel_error.mean),
                        error_max = %format!("{:.6}", stats.channel_error.max),
                        "rolling stats"
                    );
                }
            }
        }
    }
}
