//! Replay source backed by an in-memory breakpoint table
//!
//! Linearly interpolates between timestamped channel vectors, e.g. samples
//! extracted from a recorded flight session. Past the final breakpoint the
//! source returns all-zero vectors so a simulation can outrun its data
//! without failing.

use crate::source::{SourceError, TxSource};
use crate::ChannelVec;

/// Piecewise-linear replay of `(timestamp, channel vector)` breakpoints
#[derive(Debug, Clone)]
pub struct InterpolatedSource {
    times: Vec<u64>,
    values: Vec<ChannelVec>,
    channels: usize,
}

impl InterpolatedSource {
    /// Build a source from breakpoints
    ///
    /// The table must start at timestamp 0, be strictly increasing in
    /// time, and carry the same channel count in every row.
    ///
    /// # Errors
    /// Returns [`SourceError::InvalidTable`] when the table violates any
    /// of the above.
    pub fn new(samples: Vec<(u64, ChannelVec)>) -> Result<Self, SourceError> {
        let Some(first) = samples.first() else {
            return Err(SourceError::InvalidTable("table is empty"));
        };
        if first.0 != 0 {
            return Err(SourceError::InvalidTable("table must start at timestamp 0"));
        }
        let channels = first.1.len();
        if channels == 0 {
            return Err(SourceError::InvalidTable("rows must have at least one channel"));
        }

        let mut times = Vec::with_capacity(samples.len());
        let mut values = Vec::with_capacity(samples.len());
        for (ts, row) in samples {
            if let Some(&previous) = times.last() {
                if ts <= previous {
                    return Err(SourceError::InvalidTable(
                        "timestamps must be strictly increasing",
                    ));
                }
            }
            if row.len() != channels {
                return Err(SourceError::InvalidTable("uneven channel counts"));
            }
            times.push(ts);
            values.push(row);
        }

        Ok(Self {
            times,
            values,
            channels,
        })
    }

    /// Last timestamp covered by the table
    pub fn duration(&self) -> u64 {
        *self.times.last().unwrap_or(&0)
    }
}

impl TxSource for InterpolatedSource {
    fn channels(&self) -> usize {
        self.channels
    }

    fn label(&self) -> String {
        format!(
            "interpolated(breakpoints={}, channels={})",
            self.times.len(),
            self.channels
        )
    }

    fn sample(&mut self, ts: u64) -> Result<ChannelVec, SourceError> {
        if ts > self.duration() {
            return Ok(vec![0.0; self.channels]);
        }
        // First breakpoint at or after ts; the table starts at 0 so a
        // predecessor always exists when interpolation is needed.
        let upper = self.times.partition_point(|&t| t < ts);
        if self.times[upper] == ts {
            return Ok(self.values[upper].clone());
        }

        let (t0, t1) = (self.times[upper - 1], self.times[upper]);
        let fraction = (ts - t0) as f64 / (t1 - t0) as f64;
        let (row0, row1) = (&self.values[upper - 1], &self.values[upper]);
        Ok(row0
            .iter()
            .zip(row1.iter())
            .map(|(&a, &b)| a + (b - a) * fraction)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn table() -> InterpolatedSource {
        InterpolatedSource::new(vec![
            (0, vec![0.0, 1.0]),
            (100, vec![1.0, -1.0]),
            (300, vec![-1.0, 0.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_exact_breakpoints() {
        let mut source = table();
        assert_eq!(source.sample(0).unwrap(), vec![0.0, 1.0]);
        assert_eq!(source.sample(100).unwrap(), vec![1.0, -1.0]);
        assert_eq!(source.sample(300).unwrap(), vec![-1.0, 0.0]);
    }

    #[test]
    fn test_linear_interpolation_between_breakpoints() {
        let mut source = table();
        let mid = source.sample(50).unwrap();
        assert_abs_diff_eq!(mid[0], 0.5);
        assert_abs_diff_eq!(mid[1], 0.0);

        let quarter = source.sample(150).unwrap();
        assert_abs_diff_eq!(quarter[0], 0.5);
        assert_abs_diff_eq!(quarter[1], -0.75);
    }

    #[test]
    fn test_zeros_after_table_end() {
        let mut source = table();
        assert_eq!(source.sample(301).unwrap(), vec![0.0, 0.0]);
        assert_eq!(source.sample(1_000_000).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_invalid_tables_are_rejected() {
        assert!(InterpolatedSource::new(vec![]).is_err());
        assert!(InterpolatedSource::new(vec![(10, vec![0.0])]).is_err());
        assert!(InterpolatedSource::new(vec![(0, vec![])]).is_err());
        assert!(
            InterpolatedSource::new(vec![(0, vec![0.0]), (0, vec![0.5])]).is_err(),
            "duplicate timestamps must be rejected"
        );
        assert!(
            InterpolatedSource::new(vec![(0, vec![0.0]), (10, vec![0.5, 0.5])]).is_err(),
            "uneven channel counts must be rejected"
        );
    }

    #[test]
    fn test_channel_count_from_table() {
        assert_eq!(table().channels(), 2);
    }
}
