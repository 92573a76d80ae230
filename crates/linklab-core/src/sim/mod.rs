//! Link simulation engine
//!
//! The discrete-event loop that serializes competing codecs' packets onto
//! one shared, bit-rate-limited channel:
//! - Packet data and listener contract ([`packet`])
//! - Completion-ordered transmit queue ([`queue`])
//! - Configuration record and event loop ([`engine`])

pub mod engine;
pub mod packet;
pub mod queue;

pub use engine::{bits_to_ts, Setup, SharedListener, SimError};
pub use packet::{LinkPacket, PacketListener, TxData};
pub use queue::TransmitQueue;
