//! Packet data flowing through the simulated link

use crate::convert::BitVec;
use crate::{ChannelVec, IndexVec};

/// One packet in flight: everything captured at transmit time
///
/// Created when the simulator samples a source for one codec, immutable
/// once created, consumed when the transmit queue yields it.
#[derive(Debug, Clone)]
pub struct TxData {
    /// Index of the owning codec in the setup's codec list
    pub codec_id: usize,
    /// Bit position at which transmission starts
    pub start: u64,
    /// Transmit timestamp in µs, derived from `start`
    pub tx_ts: u64,
    /// Channel values as sampled from the source
    pub tx_channels: ChannelVec,
    /// Quantized channel values
    pub tx_indices: IndexVec,
    /// Over-the-air bit packet
    pub ota_data: BitVec,
}

/// Everything about a packet sent across the link, including the times
#[derive(Debug, Clone)]
pub struct LinkPacket {
    /// Transmit timestamp in µs
    pub tx_ts: u64,
    /// Channel values as sampled at transmit time
    pub tx_channels: ChannelVec,
    /// Quantized channel values at transmit time
    pub tx_indices: IndexVec,
    /// Over-the-air bit packet
    pub ota_data: BitVec,
    /// Quantized channel values decoded at the receiver
    pub rx_indices: IndexVec,
    /// Channel values reconstructed at the receiver
    pub rx_channels: ChannelVec,
    /// Receive timestamp in µs
    pub rx_ts: u64,
}

impl LinkPacket {
    /// Merge transmit-side data with decode results
    pub fn new(tx_data: TxData, rx_ts: u64, rx_indices: IndexVec, rx_channels: ChannelVec) -> Self {
        Self {
            tx_ts: tx_data.tx_ts,
            tx_channels: tx_data.tx_channels,
            tx_indices: tx_data.tx_indices,
            ota_data: tx_data.ota_data,
            rx_indices,
            rx_channels,
            rx_ts,
        }
    }

    /// Latency between transmit and receive in µs
    pub fn latency(&self) -> u64 {
        self.rx_ts - self.tx_ts
    }
}

/// Consumer of completed packets
///
/// Invoked synchronously on the simulation thread, in listener
/// registration order, once per completed packet. Listeners are expected
/// to be cheap aggregations; a slow listener stalls the simulation.
pub trait PacketListener: Send {
    fn on_packet(&mut self, codec_id: usize, packet: &LinkPacket);
}
