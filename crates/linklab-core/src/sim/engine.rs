//! Simulation configuration and event loop
//!
//! [`Setup`] is the single configuration record for one run; [`Setup::run`]
//! drives the event loop: sample, quantize, encode, enqueue, dequeue in
//! completion order, decode, timestamp, fan out to listeners. One logical
//! thread; the time service's `wait_until` is the only suspension point.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info, trace};

use crate::codec::Codec;
use crate::convert::{self, FormatError};
use crate::source::{SourceError, TxSource};
use crate::time::{InstantClock, TimeService};
use crate::DEFAULT_BITRATE;

use super::packet::{LinkPacket, PacketListener, TxData};
use super::queue::TransmitQueue;

/// A packet listener handle shared between the simulation and its owner
pub type SharedListener = Arc<Mutex<dyn PacketListener>>;

/// Fatal simulation errors
///
/// Configuration faults are detected eagerly, before the loop starts;
/// format and source faults abort a running loop. There are no retries.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("at least one codec is required")]
    NoCodecs,

    #[error("duration must be positive when set")]
    ZeroDuration,

    #[error("source {source_name} provides {source_channels} channels but codec {codec} expects {codec_channels}")]
    ChannelMismatch {
        source_name: String,
        source_channels: usize,
        codec: String,
        codec_channels: usize,
    },

    #[error("packet decode failed: {0}")]
    Format(#[from] FormatError),

    #[error("signal source failed: {0}")]
    Source(#[from] SourceError),
}

/// Convert a bit position into a link timestamp in µs
pub fn bits_to_ts(bits: u64, bitrate: u64) -> u64 {
    (bits * 1_000_000 + bitrate / 2) / bitrate
}

/// Configuration record for one simulation run
///
/// Codec ids are indices into `codecs`. Listeners are notified
/// synchronously, in registration order, once per completed packet.
pub struct Setup {
    pub source: Box<dyn TxSource>,
    pub codecs: Vec<Box<dyn Codec>>,
    pub listeners: Vec<SharedListener>,
    /// Link capacity in bits per second
    pub bitrate: u64,
    /// Run length in µs; `None` runs until externally terminated
    pub duration: Option<u64>,
    pub time_service: Box<dyn TimeService>,
}

impl Setup {
    /// Create a setup with default bitrate, batch time service, no
    /// listeners, and no duration bound
    pub fn new(source: Box<dyn TxSource>, codecs: Vec<Box<dyn Codec>>) -> Self {
        Self {
            source,
            codecs,
            listeners: Vec::new(),
            bitrate: DEFAULT_BITRATE,
            duration: None,
            time_service: Box::new(InstantClock),
        }
    }

    /// Run the simulation to completion
    ///
    /// The source is released on every exit path, including errors.
    pub fn run(mut self) -> Result<(), SimError> {
        self.validate()?;
        info!(
            source = %self.source.label(),
            bitrate = self.bitrate,
            codecs = self.codecs.len(),
            "starting simulation"
        );
        self.source.start(self.time_service.as_ref())?;
        let result = self.run_loop();
        self.source.stop();
        result
    }

    fn validate(&self) -> Result<(), SimError> {
        if self.codecs.is_empty() {
            return Err(SimError::NoCodecs);
        }
        if self.duration == Some(0) {
            return Err(SimError::ZeroDuration);
        }
        for codec in &self.codecs {
            if codec.channels() != self.source.channels() {
                return Err(SimError::ChannelMismatch {
                    source_name: self.source.label(),
                    source_channels: self.source.channels(),
                    codec: codec.label(),
                    codec_channels: codec.channels(),
                });
            }
        }
        Ok(())
    }

    fn run_loop(&mut self) -> Result<(), SimError> {
        let duration_in_bits = self
            .duration
            .map(|duration| (self.bitrate * duration).div_ceil(1_000_000));

        let mut queue = TransmitQueue::new();
        for codec_id in 0..self.codecs.len() {
            let data = self.transmit(0, codec_id)?;
            queue.push(data);
        }

        loop {
            // One entry per codec is always in flight, so the queue only
            // drains when the duration bound stops re-arming below.
            let Some((position, tx_data)) = queue.pop() else {
                break;
            };
            let rx_ts = bits_to_ts(position, self.bitrate);
            self.time_service.wait_until(rx_ts);

            let codec_id = tx_data.codec_id;
            let codec = &mut self.codecs[codec_id];
            let rx_indices = codec.receive(&tx_data.ota_data)?;
            let rx_channels = convert::dequantize(&rx_indices, codec.bits());
            let packet = LinkPacket::new(tx_data, rx_ts, rx_indices, rx_channels);
            trace!(codec_id, position, rx_ts, "packet delivered");

            for listener in &self.listeners {
                if let Ok(mut listener) = listener.lock() {
                    listener.on_packet(codec_id, &packet);
                }
            }

            if let Some(limit) = duration_in_bits {
                if position >= limit {
                    debug!(position, "configured duration reached");
                    break;
                }
            }
            let data = self.transmit(position, codec_id)?;
            queue.push(data);
        }
        Ok(())
    }

    /// Sample the source for one codec and build the next in-flight packet
    fn transmit(&mut self, start: u64, codec_id: usize) -> Result<TxData, SimError> {
        let tx_ts = bits_to_ts(start, self.bitrate);
        let tx_channels = self.source.sample(tx_ts)?;
        let codec = &mut self.codecs[codec_id];
        let tx_indices = convert::quantize(&tx_channels, codec.bits());
        let ota_data = codec.transmit(&tx_indices);
        Ok(TxData {
            codec_id,
            start,
            tx_ts,
            tx_channels,
            tx_indices,
            ota_data,
        })
    }
}
