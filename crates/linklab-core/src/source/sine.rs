//! Synthetic sine-wave source
//!
//! Deterministic, infinite, and cheap; the reference signal for batch
//! analysis and end-to-end tests. Channels are phase-shifted copies of
//! the same wave so every axis stays within [-1.0, 1.0] while remaining
//! distinguishable.

use std::f64::consts::PI;

use crate::source::{SourceError, TxSource};
use crate::ChannelVec;

/// Sine source: channel `i` is `sin(2π·f·t + i·π/2)`
#[derive(Debug, Clone)]
pub struct SineSource {
    frequency: f64,
    channels: usize,
}

impl SineSource {
    /// Create a sine source
    ///
    /// # Arguments
    /// * `frequency` - oscillation frequency in Hz
    /// * `channels` - number of axes to produce
    pub fn new(frequency: f64, channels: usize) -> Self {
        Self {
            frequency,
            channels,
        }
    }
}

impl TxSource for SineSource {
    fn channels(&self) -> usize {
        self.channels
    }

    fn label(&self) -> String {
        format!(
            "sine(frequency={}, channels={})",
            self.frequency, self.channels
        )
    }

    fn sample(&mut self, ts: u64) -> Result<ChannelVec, SourceError> {
        let seconds = ts as f64 / 1e6;
        Ok((0..self.channels)
            .map(|i| {
                let phase_shift = i as f64 * 0.5 * PI;
                (2.0 * PI * self.frequency * seconds + phase_shift).sin()
            })
            .collect())
    }
}
