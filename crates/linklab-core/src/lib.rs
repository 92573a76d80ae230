//! Linklab Core - Link simulation engine, wire codecs, and statistics
//!
//! This library provides the core functionality for evaluating how different
//! wire encodings for continuous control-axis data behave when serialized
//! over a bandwidth-limited, single-channel link. It measures per-packet
//! latency and reconstruction error for every configured codec.

pub mod codec;
pub mod convert;
pub mod sim;
pub mod source;
pub mod stats;
pub mod time;

pub use codec::{delta::DeltaCodec, raw::RawCodec, Codec};
pub use convert::{BitVec, FormatError};
pub use sim::{bits_to_ts, LinkPacket, PacketListener, Setup, SimError, TransmitQueue, TxData};
pub use source::{interpolated::InterpolatedSource, sine::SineSource, SourceError, TxSource};
pub use stats::{
    calculate,
    collect::{ChannelListener, Collector, PacketMetric, RollingStatsCollector},
    BasicStats, Stats, StatsError,
};
pub use time::{InstantClock, RealtimeClock, TimeService};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default link capacity in bits per second
pub const DEFAULT_BITRATE: u64 = 20_000;

/// A vector of channel values, one per control axis, each in [-1.0, 1.0]
pub type ChannelVec = Vec<f64>;

/// A vector of quantized channel indices in [0, 2^bits - 1] (deltas may be negative)
pub type IndexVec = Vec<i64>;
