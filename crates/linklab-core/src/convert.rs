//! Conversion primitives between channel values, quantized indices, and bits
//!
//! Three value domains flow through the simulator:
//! - channel values: `f64` in [-1.0, 1.0]
//! - quantized indices: `i64` in [0, 2^bits - 1] (delta coding also uses
//!   negative values)
//! - wire bits: [`BitVec`], most significant bit first
//!
//! All conversions here are pure and bit-exact; codecs are built entirely
//! on top of them.

use std::fmt;

use thiserror::Error;

use crate::{ChannelVec, IndexVec};

/// Errors produced when a bit sequence does not match the expected layout
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("bit sequence of {len} bits does not divide into {width}-bit fields")]
    Misaligned { len: usize, width: usize },
}

/// A finite, ordered bit sequence
///
/// Packet sizes in this domain are tens of bits, so the representation
/// favors exactness and simple slicing over packing density. Bits are
/// ordered most significant first, matching the wire layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitVec {
    bits: Vec<bool>,
}

impl BitVec {
    /// Create an empty bit sequence
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// Create an empty bit sequence with room for `bits` bits
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bits: Vec::with_capacity(bits),
        }
    }

    /// Length in bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True when the sequence contains no bits
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Append a single bit
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Append all bits of `other`, preserving order
    pub fn extend(&mut self, other: &BitVec) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Get the bit at `index` (0 = most significant / first on the wire)
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Iterate over bits in wire order
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Split into equal-width pieces, preserving order
    ///
    /// # Errors
    /// Returns [`FormatError::Misaligned`] if the length is not a multiple
    /// of `width`.
    pub fn chunks(&self, width: usize) -> Result<Vec<BitVec>, FormatError> {
        if width == 0 || !self.bits.len().is_multiple_of(width) {
            return Err(FormatError::Misaligned {
                len: self.bits.len(),
                width,
            });
        }
        Ok(self
            .bits
            .chunks(width)
            .map(|piece| BitVec {
                bits: piece.to_vec(),
            })
            .collect())
    }
}

impl fmt::Display for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromIterator<bool> for BitVec {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

/// Ordered concatenation of bit sequences, channel order preserved
pub fn concat<I: IntoIterator<Item = BitVec>>(pieces: I) -> BitVec {
    let mut result = BitVec::new();
    for piece in pieces {
        result.extend(&piece);
    }
    result
}

/// The largest index representable at `bits` width: 2^bits - 1
pub fn index_span(bits: u32) -> i64 {
    (1i64 << bits) - 1
}

/// Map a channel value in [-1.0, 1.0] to a quantized index in [0, 2^bits - 1]
///
/// No clamping is performed; the caller guarantees the domain.
pub fn float_to_index(value: f64, bits: u32) -> i64 {
    (((value + 1.0) / 2.0) * index_span(bits) as f64).round() as i64
}

/// Exact inverse of [`float_to_index`] up to quantization resolution
pub fn index_to_float(index: i64, bits: u32) -> f64 {
    ((index as f64 / index_span(bits) as f64) * 2.0) - 1.0
}

/// Encode `value` as a fixed-width bit sequence, MSB first
///
/// Unsigned encoding for `signed = false`, two's complement otherwise.
/// The caller guarantees that `value` fits the width; quantization and
/// delta saturation uphold this for all codec paths.
pub fn pack(value: i64, bits: u32, signed: bool) -> BitVec {
    debug_assert!(bits >= 1 && bits <= 32, "field width out of range: {bits}");
    debug_assert!(
        if signed {
            value >= -(1i64 << (bits - 1)) && value < (1i64 << (bits - 1))
        } else {
            value >= 0 && value <= index_span(bits)
        },
        "value {value} does not fit {bits} bits (signed = {signed})"
    );
    let raw = value as u64;
    (0..bits).rev().map(|i| (raw >> i) & 1 == 1).collect()
}

/// Decode a fixed-width bit sequence back to an integer
///
/// The sequence length is the field width. Two's complement
/// interpretation for `signed = true`.
pub fn unpack(data: &BitVec, signed: bool) -> i64 {
    let width = data.len();
    debug_assert!(width >= 1 && width <= 32, "field width out of range: {width}");
    let mut raw: u64 = 0;
    for bit in data.iter() {
        raw = (raw << 1) | bit as u64;
    }
    if signed && data.get(0) == Some(true) {
        raw as i64 - (1i64 << width)
    } else {
        raw as i64
    }
}

/// Quantize a channel vector elementwise at `bits` width
pub fn quantize(values: &[f64], bits: u32) -> IndexVec {
    values.iter().map(|&v| float_to_index(v, bits)).collect()
}

/// Dequantize an index vector elementwise at `bits` width
pub fn dequantize(indices: &[i64], bits: u32) -> ChannelVec {
    indices.iter().map(|&i| index_to_float(i, bits)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_float_to_index_endpoints() {
        assert_eq!(float_to_index(-1.0, 10), 0);
        assert_eq!(float_to_index(0.0, 10), 512);
        assert_eq!(float_to_index(1.0, 10), 1023);
    }

    #[test]
    fn test_index_to_float_endpoints() {
        assert_abs_diff_eq!(index_to_float(0, 4), -1.0);
        assert_abs_diff_eq!(index_to_float(15, 4), 1.0);
    }

    #[test]
    fn test_quantization_round_trip_is_exact_on_indices() {
        for bits in [1, 4, 8, 10] {
            for index in 0..=index_span(bits) {
                let value = index_to_float(index, bits as u32);
                assert_eq!(float_to_index(value, bits as u32), index);
            }
        }
    }

    #[test]
    fn test_quantization_error_bound() {
        // For any in-domain float the reconstruction error is at most
        // 1 / (2^bits - 1).
        let bits = 10;
        let bound = 1.0 / index_span(bits) as f64;
        for step in 0..=2000 {
            let value = -1.0 + step as f64 / 1000.0;
            let reconstructed = index_to_float(float_to_index(value, bits), bits);
            assert!(
                (reconstructed - value).abs() <= bound,
                "error for {value} exceeds {bound}"
            );
        }
    }

    #[test]
    fn test_pack_unsigned_wire_layout() {
        assert_eq!(pack(float_to_index(-1.0, 10), 10, false).to_string(), "0000000000");
        assert_eq!(pack(float_to_index(0.0, 10), 10, false).to_string(), "1000000000");
        assert_eq!(pack(float_to_index(1.0, 10), 10, false).to_string(), "1111111111");
    }

    #[test]
    fn test_pack_unpack_unsigned_round_trip() {
        for bits in [1u32, 3, 8, 10] {
            for value in 0..=index_span(bits) {
                let packed = pack(value, bits, false);
                assert_eq!(packed.len(), bits as usize);
                assert_eq!(unpack(&packed, false), value);
            }
        }
    }

    #[test]
    fn test_pack_unpack_signed_round_trip() {
        for bits in [2u32, 3, 5, 8] {
            let half = 1i64 << (bits - 1);
            for value in -half..half {
                let packed = pack(value, bits, true);
                assert_eq!(packed.len(), bits as usize);
                assert_eq!(unpack(&packed, true), value);
            }
        }
    }

    #[test]
    fn test_signed_negative_is_twos_complement() {
        assert_eq!(pack(-1, 3, true).to_string(), "111");
        assert_eq!(pack(-4, 3, true).to_string(), "100");
        assert_eq!(pack(3, 3, true).to_string(), "011");
    }

    #[test]
    fn test_concat_preserves_order() {
        let joined = concat(vec![pack(5, 3, false), pack(1, 2, false)]);
        assert_eq!(joined.to_string(), "10101");
        assert_eq!(joined.len(), 5);
    }

    #[test]
    fn test_chunks_splits_evenly() {
        let joined = concat(vec![pack(5, 3, false), pack(2, 3, false)]);
        let pieces = joined.chunks(3).unwrap();
        assert_eq!(pieces.len(), 2);
        assert_eq!(unpack(&pieces[0], false), 5);
        assert_eq!(unpack(&pieces[1], false), 2);
    }

    #[test]
    fn test_chunks_rejects_misaligned_length() {
        let bits = pack(9, 5, false);
        assert_eq!(
            bits.chunks(3),
            Err(FormatError::Misaligned { len: 5, width: 3 })
        );
    }

    #[test]
    fn test_quantize_dequantize_vectors() {
        let values = vec![-1.0, 0.0, 1.0];
        let indices = quantize(&values, 8);
        assert_eq!(indices, vec![0, 128, 255]);
        let back = dequantize(&indices, 8);
        for (a, b) in back.iter().zip(values.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1.0 / 255.0);
        }
    }
}
