//! Run configuration
//!
//! A JSON file describing one simulation run: link bitrate, duration,
//! source shape, and the codec panel. Every field has a default so a
//! partial file (or none at all) still yields a runnable setup.

use std::path::Path;

use linklab_core::{Codec, DeltaCodec, RawCodec, DEFAULT_BITRATE};
use serde::{Deserialize, Serialize};

fn default_bitrate() -> u64 {
    DEFAULT_BITRATE
}

fn default_duration_us() -> Option<u64> {
    Some(3_000_000)
}

fn default_channels() -> usize {
    4
}

fn default_frequency() -> f64 {
    0.5
}

/// Default codec panel: raw at increasing widths plus one delta codec
fn default_codecs() -> Vec<CodecConfig> {
    vec![
        CodecConfig::Raw { bits: 8 },
        CodecConfig::Raw { bits: 9 },
        CodecConfig::Raw { bits: 10 },
        CodecConfig::Delta {
            bits: 10,
            delta_bits: 5,
        },
    ]
}

/// One codec in the panel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CodecConfig {
    Raw { bits: u32 },
    Delta { bits: u32, delta_bits: u32 },
}

impl CodecConfig {
    /// Instantiate the codec for `channels` axes
    pub fn build(&self, channels: usize) -> Box<dyn Codec> {
        match *self {
            CodecConfig::Raw { bits } => Box::new(RawCodec::new(channels, bits)),
            CodecConfig::Delta { bits, delta_bits } => {
                Box::new(DeltaCodec::new(channels, bits, delta_bits))
            }
        }
    }
}

/// Simulation run configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Link capacity in bits per second
    #[serde(default = "default_bitrate")]
    pub bitrate: u64,
    /// Batch run length in µs (None = unbounded, realtime only)
    #[serde(default = "default_duration_us")]
    pub duration_us: Option<u64>,
    /// Number of control axes
    #[serde(default = "default_channels")]
    pub channels: usize,
    /// Sine source frequency in Hz
    #[serde(default = "default_frequency")]
    pub sine_frequency: f64,
    /// Codec panel, in display order
    #[serde(default = "default_codecs")]
    pub codecs: Vec<CodecConfig>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            bitrate: default_bitrate(),
            duration_us: default_duration_us(),
            channels: default_channels(),
            sine_frequency: default_frequency(),
            codecs: default_codecs(),
        }
    }
}

impl RunConfig {
    /// Load a config file, falling back to defaults on any error
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "loaded run config");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Instantiate the configured codec panel
    pub fn build_codecs(&self) -> Vec<Box<dyn Codec>> {
        self.codecs
            .iter()
            .map(|codec| codec.build(self.channels))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.bitrate, 20_000);
        assert_eq!(config.duration_us, Some(3_000_000));
        assert_eq!(config.channels, 4);
        assert_eq!(config.codecs.len(), 4);
    }

    #[test]
    fn test_round_trip() {
        let config = RunConfig {
            bitrate: 50_000,
            duration_us: None,
            channels: 2,
            sine_frequency: 2.0,
            codecs: vec![CodecConfig::Delta {
                bits: 10,
                delta_bits: 6,
            }],
        };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string_pretty(&config).unwrap().as_bytes())
            .unwrap();

        let loaded = RunConfig::load(file.path());
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: RunConfig = serde_json::from_str(r#"{ "bitrate": 9600 }"#).unwrap();
        assert_eq!(parsed.bitrate, 9_600);
        assert_eq!(parsed.channels, 4);
        assert_eq!(parsed.codecs, default_codecs());
    }

    #[test]
    fn test_unparseable_config_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert_eq!(RunConfig::load(file.path()), RunConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        assert_eq!(
            RunConfig::load(Path::new("/nonexistent/linklab.json")),
            RunConfig::default()
        );
    }

    #[test]
    fn test_codec_config_builds_expected_labels() {
        let raw = CodecConfig::Raw { bits: 10 }.build(4);
        assert_eq!(raw.label(), "raw(channels=4, bits=10)");

        let delta = CodecConfig::Delta {
            bits: 10,
            delta_bits: 5,
        }
        .build(4);
        assert_eq!(delta.label(), "delta(channels=4, bits=10, delta_bits=5)");
    }
}
