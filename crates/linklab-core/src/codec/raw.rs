//! Absolute-value codec: every packet carries every channel at full width

use crate::convert::{concat, pack, unpack, BitVec, FormatError};
use crate::IndexVec;

use super::Codec;

/// Stateless codec transmitting each quantized value verbatim
///
/// Packet length is always `channels * bits`. Receive is the exact inverse
/// of transmit for every packet on its own.
#[derive(Debug, Clone)]
pub struct RawCodec {
    channels: usize,
    bits: u32,
}

impl RawCodec {
    /// Create a raw codec for `channels` axes quantized at `bits` width
    pub fn new(channels: usize, bits: u32) -> Self {
        Self { channels, bits }
    }
}

impl Codec for RawCodec {
    fn channels(&self) -> usize {
        self.channels
    }

    fn bits(&self) -> u32 {
        self.bits
    }

    fn label(&self) -> String {
        format!("raw(channels={}, bits={})", self.channels, self.bits)
    }

    fn transmit(&mut self, data: &[i64]) -> BitVec {
        concat(data.iter().map(|&value| pack(value, self.bits, false)))
    }

    fn receive(&mut self, data: &BitVec) -> Result<IndexVec, FormatError> {
        Ok(data
            .chunks(self.bits as usize)?
            .iter()
            .map(|field| unpack(field, false))
            .collect())
    }
}
