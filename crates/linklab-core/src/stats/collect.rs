//! Packet listeners: capture buffers, rolling windows, channel fan-out

use std::collections::{BTreeMap, HashMap, VecDeque};

use crossbeam_channel::{Receiver, Sender};
use tracing::trace;

use crate::sim::{LinkPacket, PacketListener};

use super::{BasicStats, Stats, StatsError};

/// Retains packets per codec, optionally bounded by a trailing time window
///
/// With a `time_limit`, packets are evicted from the front while
/// `newest.rx_ts - oldest.rx_ts >= time_limit` (sliding window by time,
/// not count). Without one, the collector keeps the whole capture for
/// offline reports.
#[derive(Debug, Default)]
pub struct Collector {
    packets: HashMap<usize, VecDeque<LinkPacket>>,
    time_limit: Option<u64>,
}

impl Collector {
    /// Collector that keeps every packet
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector bounded to a trailing window of `time_limit` µs
    pub fn with_time_limit(time_limit: u64) -> Self {
        Self {
            packets: HashMap::new(),
            time_limit: Some(time_limit),
        }
    }

    /// Captured packets for one codec, oldest first
    pub fn packets(&self, codec_id: usize) -> Option<&VecDeque<LinkPacket>> {
        self.packets.get(&codec_id)
    }

    /// Codec ids seen so far, ascending
    pub fn codec_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.packets.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl PacketListener for Collector {
    fn on_packet(&mut self, codec_id: usize, packet: &LinkPacket) {
        let buffer = self.packets.entry(codec_id).or_default();
        buffer.push_back(packet.clone());
        if let Some(limit) = self.time_limit {
            while let Some(oldest) = buffer.front() {
                if packet.rx_ts - oldest.rx_ts >= limit {
                    buffer.pop_front();
                } else {
                    break;
                }
            }
        }
    }
}

/// Per-packet measurement derived once at collection time
#[derive(Debug, Clone, Copy)]
pub struct PacketMetric {
    /// Receive timestamp in µs
    pub rx_ts: u64,
    /// rx_ts - tx_ts in µs
    pub latency: u64,
    /// Largest absolute channel error in the packet
    pub max_error: f64,
    /// Mean absolute channel error in the packet
    pub mean_error: f64,
    /// Packet length in bits
    pub ota_bits: usize,
}

impl PacketMetric {
    fn from_packet(packet: &LinkPacket) -> Self {
        let errors: Vec<f64> = packet
            .rx_channels
            .iter()
            .zip(packet.tx_channels.iter())
            .map(|(rx, tx)| (rx - tx).abs())
            .collect();
        let max_error = errors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_error = errors.iter().sum::<f64>() / errors.len() as f64;
        Self {
            rx_ts: packet.rx_ts,
            latency: packet.latency(),
            max_error,
            mean_error,
            ota_bits: packet.ota_data.len(),
        }
    }
}

/// Rolling per-codec statistics over a trailing time window
///
/// Adding is cheap: a metric is derived and appended, nothing is evicted.
/// Eviction happens lazily in [`stats`](Self::stats), which drops all
/// metrics older than `time_limit` relative to the newest before
/// summarizing the retained window.
#[derive(Debug)]
pub struct RollingStatsCollector {
    metrics: HashMap<usize, Vec<PacketMetric>>,
    time_limit: u64,
}

impl RollingStatsCollector {
    /// Create a collector with a trailing window of `time_limit` µs
    pub fn new(time_limit: u64) -> Self {
        Self {
            metrics: HashMap::new(),
            time_limit,
        }
    }

    /// Snapshot of the current window for one codec
    ///
    /// # Errors
    /// Returns [`StatsError::EmptyWindow`] when no metric was ever added
    /// for `codec_id` — callers must not ask for stats before the first
    /// packet.
    pub fn stats(&mut self, codec_id: usize) -> Result<Stats, StatsError> {
        let metrics = self
            .metrics
            .get_mut(&codec_id)
            .ok_or(StatsError::EmptyWindow { codec_id })?;
        let newest = metrics
            .last()
            .ok_or(StatsError::EmptyWindow { codec_id })?
            .rx_ts;
        metrics.retain(|metric| newest - metric.rx_ts <= self.time_limit);

        let mut packet_lengths = BTreeMap::new();
        for metric in metrics.iter() {
            *packet_lengths.entry(metric.ota_bits).or_insert(0) += 1;
        }
        let latency = BasicStats::from_series(metrics.iter().map(|m| m.latency as f64))
            .ok_or(StatsError::EmptyWindow { codec_id })?;
        let mean_error = metrics.iter().map(|m| m.mean_error).sum::<f64>() / metrics.len() as f64;
        let max_error = metrics
            .iter()
            .map(|m| m.max_error)
            .fold(f64::NEG_INFINITY, f64::max);

        Ok(Stats {
            total_packets: metrics.len(),
            packet_lengths,
            latency,
            channel_error: BasicStats {
                max: max_error,
                mean: mean_error,
            },
        })
    }
}

impl PacketListener for RollingStatsCollector {
    fn on_packet(&mut self, codec_id: usize, packet: &LinkPacket) {
        self.metrics
            .entry(codec_id)
            .or_default()
            .push(PacketMetric::from_packet(packet));
    }
}

/// Forwards packets over a channel to a consumer thread
///
/// The simulation side stays synchronous; the receiving end (a UI or a
/// long-running aggregation) drains at its own pace. Once the receiver is
/// gone, packets are dropped silently.
pub struct ChannelListener {
    sender: Sender<(usize, LinkPacket)>,
}

impl ChannelListener {
    /// Create a listener and the receiving end of its channel
    pub fn new() -> (Self, Receiver<(usize, LinkPacket)>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }
}

impl PacketListener for ChannelListener {
    fn on_packet(&mut self, codec_id: usize, packet: &LinkPacket) {
        if self.sender.send((codec_id, packet.clone())).is_err() {
            trace!(codec_id, "packet channel closed, dropping packet");
        }
    }
}
