//! Signal sources
//!
//! A source produces a channel-value vector for any requested simulation
//! timestamp. In-tree sources are synthetic ([`sine`]) or replay
//! pre-recorded samples ([`interpolated`]); device-backed sources live
//! outside this crate and plug in through the same trait.

pub mod interpolated;
pub mod sine;

use thiserror::Error;

use crate::time::TimeService;
use crate::ChannelVec;

/// Errors at the signal-source boundary
///
/// Device failures are fatal to the source's session; the simulator
/// aborts the run but still releases the source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("signal source device disconnected")]
    Disconnected,

    #[error("input events were dropped before they could be read")]
    EventsDropped,

    #[error("invalid sample table: {0}")]
    InvalidTable(&'static str),
}

/// A stream of channel-value vectors addressed by simulation timestamp
///
/// `sample` timestamps are non-negative and monotonically non-decreasing
/// across calls for one instance. The simulator calls `start` before the
/// first sample and guarantees `stop` on every exit path.
pub trait TxSource: Send {
    /// Number of channels this source produces
    fn channels(&self) -> usize;

    /// Human-readable identity for logs and reports
    fn label(&self) -> String;

    /// Bind the simulation epoch and acquire any underlying resource
    fn start(&mut self, time_service: &dyn TimeService) -> Result<(), SourceError> {
        let _ = time_service;
        Ok(())
    }

    /// Produce the channel vector for simulation time `ts` (µs)
    fn sample(&mut self, ts: u64) -> Result<ChannelVec, SourceError>;

    /// Release the underlying resource; idempotent
    fn stop(&mut self) {}
}
