//! Statistics over captured link packets
//!
//! Whole-capture aggregation lives here; live listeners that collect
//! packets and rolling windows are in [`collect`].

pub mod collect;

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::sim::LinkPacket;

/// Statistics misuse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("cannot compute statistics over an empty capture")]
    EmptyCapture,

    #[error("no metrics recorded for codec {codec_id}")]
    EmptyWindow { codec_id: usize },
}

/// Minimal summary of a numeric series: maximum and mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BasicStats {
    pub max: f64,
    pub mean: f64,
}

impl BasicStats {
    /// Summarize a series; `None` when the series is empty
    pub fn from_series<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        for value in values {
            max = max.max(value);
            sum += value;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(Self {
            max,
            mean: sum / count as f64,
        })
    }
}

/// Per-codec statistics snapshot
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    /// Number of packets covered by this snapshot
    pub total_packets: usize,
    /// Histogram of packet lengths in bits
    pub packet_lengths: BTreeMap<usize, usize>,
    /// Latency summary in µs
    pub latency: BasicStats,
    /// Absolute channel reconstruction error summary
    pub channel_error: BasicStats,
}

/// Aggregate a whole capture of one codec's packets
///
/// Latency is summarized per packet; channel error is summarized over all
/// per-channel absolute differences in the capture.
///
/// # Errors
/// Returns [`StatsError::EmptyCapture`] for an empty input.
pub fn calculate(packets: &[LinkPacket]) -> Result<Stats, StatsError> {
    let mut packet_lengths = BTreeMap::new();
    for packet in packets {
        *packet_lengths.entry(packet.ota_data.len()).or_insert(0) += 1;
    }

    let latency = BasicStats::from_series(packets.iter().map(|p| p.latency() as f64))
        .ok_or(StatsError::EmptyCapture)?;
    let channel_error = BasicStats::from_series(packets.iter().flat_map(|p| {
        p.rx_channels
            .iter()
            .zip(p.tx_channels.iter())
            .map(|(rx, tx)| (rx - tx).abs())
    }))
    .ok_or(StatsError::EmptyCapture)?;

    Ok(Stats {
        total_packets: packets.len(),
        packet_lengths,
        latency,
        channel_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::pack;
    use approx::assert_abs_diff_eq;

    fn packet(tx_ts: u64, rx_ts: u64, tx: Vec<f64>, rx: Vec<f64>, bits: u32) -> LinkPacket {
        LinkPacket {
            tx_ts,
            tx_channels: tx,
            tx_indices: vec![0],
            ota_data: pack(0, bits, false),
            rx_indices: vec![0],
            rx_channels: rx,
            rx_ts,
        }
    }

    #[test]
    fn test_basic_stats_from_series() {
        let stats = BasicStats::from_series([1.0, 2.0, 6.0]).unwrap();
        assert_abs_diff_eq!(stats.max, 6.0);
        assert_abs_diff_eq!(stats.mean, 3.0);
    }

    #[test]
    fn test_basic_stats_empty_series() {
        assert!(BasicStats::from_series([]).is_none());
    }

    #[test]
    fn test_calculate_aggregates_capture() {
        let capture = vec![
            packet(0, 2_000, vec![0.0, 0.5], vec![0.1, 0.5], 10),
            packet(2_000, 4_000, vec![1.0, -1.0], vec![0.7, -1.0], 10),
        ];
        let stats = calculate(&capture).unwrap();

        assert_eq!(stats.total_packets, 2);
        assert_eq!(stats.packet_lengths.get(&10), Some(&2));
        assert_abs_diff_eq!(stats.latency.max, 2_000.0);
        assert_abs_diff_eq!(stats.latency.mean, 2_000.0);
        assert_abs_diff_eq!(stats.channel_error.max, 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.channel_error.mean, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_calculate_rejects_empty_capture() {
        assert!(matches!(calculate(&[]), Err(StatsError::EmptyCapture)));
    }

    #[test]
    fn test_packet_length_histogram() {
        let capture = vec![
            packet(0, 1_000, vec![0.0], vec![0.0], 8),
            packet(1_000, 2_000, vec![0.0], vec![0.0], 8),
            packet(2_000, 3_000, vec![0.0], vec![0.0], 12),
        ];
        let stats = calculate(&capture).unwrap();
        assert_eq!(stats.packet_lengths.get(&8), Some(&2));
        assert_eq!(stats.packet_lengths.get(&12), Some(&1));
    }
}
