//! Binary arithmetic coder (§4.8).
//!
//! A 64-bit range coder operating bit-at-a-time: each bit is coded
//! against its own `P(bit = 0)`, expressed as a 64-bit fixed-point
//! fraction (`p_zero / 2^64`), so the coder never needs a shared
//! cumulative-frequency table the way a multi-symbol range coder would.
//! This is the representation `gauss_freq_bac_64` builds for the
//! Gaussian-sample bit sequences in the entropy dispatcher (§4.9).
//!
//! Renormalization follows the classical Witten-Neal-Cleary (CACM 1987)
//! E1/E2/E3 scaling, adapted from bytes to single bits and from 16/32-bit
//! registers to 64-bit ones; carry never needs explicit propagation
//! because E3 underflow scaling defers the ambiguous bit via `pending`.
//! Grounded in `original_source/src/utils/entropy/bac.c`'s `mul64hi`
//! (the widening 64x64->128 multiply used for every range split) and its
//! 16-bit big-endian stream length header.

use crate::packer::BitPacker;

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum BacError {
    #[error("stream is empty or truncated")]
    Truncated,
    #[error("encoded bit count {0} exceeds the 16-bit length header's range")]
    TooManyBits(usize),
}

const HALF: u64 = 1 << 63;
const QUARTER: u64 = 1 << 62;
const THREE_QUARTER: u64 = HALF + QUARTER;

/// High 64 bits of the full 128-bit product `a * b`.
#[inline]
pub fn mul64hi(a: u64, b: u64) -> u64 {
    ((a as u128 * b as u128) >> 64) as u64
}

pub struct BacEncoder {
    low: u64,
    high: u64,
    pending: u32,
    bits: Vec<bool>,
}

impl BacEncoder {
    pub fn new() -> Self {
        BacEncoder { low: 0, high: u64::MAX, pending: 0, bits: Vec::new() }
    }

    fn emit(&mut self, bit: bool) {
        self.bits.push(bit);
        for _ in 0..self.pending {
            self.bits.push(!bit);
        }
        self.pending = 0;
    }

    /// Code one bit against `p_zero`, the fixed-point `P(bit = 0)` as a
    /// fraction of `2^64`.
    pub fn encode_bit(&mut self, bit: bool, p_zero: u64) {
        let range = (self.high - self.low) as u128 + 1;
        let split = ((range * p_zero as u128) >> 64) as u64;
        let split = split.clamp(1, (self.high - self.low).saturating_sub(1).max(1));
        let mid = self.low + split - 1;
        if !bit {
            self.high = mid;
        } else {
            self.low = mid + 1;
        }
        loop {
            if self.high < HALF {
                self.emit(false);
            } else if self.low >= HALF {
                self.emit(true);
                self.low -= HALF;
                self.high -= HALF;
            } else if self.low >= QUARTER && self.high < THREE_QUARTER {
                self.pending += 1;
                self.low -= QUARTER;
                self.high -= QUARTER;
            } else {
                break;
            }
            self.low <<= 1;
            self.high = (self.high << 1) | 1;
        }
    }

    /// Flush the final disambiguating bit(s) and return the coded bit
    /// sequence (MSB-first, ready to be packed).
    pub fn finish(mut self) -> Vec<bool> {
        self.pending += 1;
        if self.low < QUARTER {
            self.emit(false);
        } else {
            self.emit(true);
        }
        self.bits
    }

    /// Encode a full sequence and write it to `packer` with a 16-bit
    /// big-endian bit-count header, matching the original's stream
    /// framing.
    pub fn encode_sequence(bits_and_probs: &[(bool, u64)], packer: &mut BitPacker) -> Result<(), BacError> {
        let mut enc = BacEncoder::new();
        for &(bit, p_zero) in bits_and_probs {
            enc.encode_bit(bit, p_zero);
        }
        let out_bits = enc.finish();
        if out_bits.len() > u16::MAX as usize {
            return Err(BacError::TooManyBits(out_bits.len()));
        }
        packer.write(out_bits.len() as u64, 16).expect("16-bit length header always fits");
        for b in out_bits {
            packer.write(b as u64, 1).expect("single-bit write never exceeds capacity once length header fit");
        }
        Ok(())
    }
}

impl Default for BacEncoder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct BacDecoder {
    low: u64,
    high: u64,
    code: u64,
    remaining: usize,
}

impl BacDecoder {
    /// Read the 16-bit length header and the first 64 code bits from
    /// `packer`.
    pub fn new(packer: &mut BitPacker) -> Result<Self, BacError> {
        let n = packer.read(16).map_err(|_| BacError::Truncated)? as usize;
        let mut code = 0u64;
        for _ in 0..64 {
            let bit = packer.read(1).unwrap_or(0);
            code = (code << 1) | bit;
        }
        Ok(BacDecoder { low: 0, high: u64::MAX, code, remaining: n })
    }

    /// Decode one bit against the same `p_zero` the encoder used.
    pub fn decode_bit(&mut self, p_zero: u64, packer: &mut BitPacker) -> bool {
        let range = (self.high - self.low) as u128 + 1;
        let split = ((range * p_zero as u128) >> 64) as u64;
        let split = split.clamp(1, (self.high - self.low).saturating_sub(1).max(1));
        let mid = self.low + split - 1;
        let bit = self.code > mid;
        if !bit {
            self.high = mid;
        } else {
            self.low = mid + 1;
        }
        loop {
            if self.high < HALF {
                // no-op: both converge below HALF
            } else if self.low >= HALF {
                self.low -= HALF;
                self.high -= HALF;
                self.code -= HALF;
            } else if self.low >= QUARTER && self.high < THREE_QUARTER {
                self.low -= QUARTER;
                self.high -= QUARTER;
                self.code -= QUARTER;
            } else {
                break;
            }
            self.low <<= 1;
            self.high = (self.high << 1) | 1;
            let next = packer.read(1).unwrap_or(0);
            self.code = (self.code << 1) | next;
        }
        bit
    }

    pub fn bits_remaining(&self) -> usize {
        self.remaining
    }
}

/// Build the per-position `P(bit = 0)` fixed-point table used to code a
/// discrete Gaussian's bit-plane representation: position `i`'s
/// probability mass is proportional to `exp(-i^2 / (2 sigma^2))`,
/// converted to a `2^64` fixed-point fraction.
pub fn gauss_freq_bac_64(bits: u32, sigma: f64) -> Vec<u64> {
    let n = 1usize << bits;
    (0..n)
        .map(|i| {
            let p = (-((i * i) as f64) / (2.0 * sigma * sigma)).exp();
            let clamped = p.clamp(1.0 / (u64::MAX as f64), 1.0 - 1.0 / (u64::MAX as f64));
            (clamped * u64::MAX as f64) as u64
        })
        .collect()
}

/// Cumulative-frequency table (fixed-point, `2^64` scale) derived from
/// `gauss_freq_bac_64`'s per-position masses, with `+1` additive
/// smoothing (so no symbol ever carries zero probability mass) and each
/// resulting fixed-point probability clamped to `[4, 2^64-4]` so the
/// arithmetic coder's range split can never degenerate to zero width.
pub fn bac_distfreq_64(bits: u32, sigma: f64) -> Vec<u64> {
    let raw = gauss_freq_bac_64(bits, sigma);
    let total: f64 = raw.iter().map(|&f| f as f64 + 1.0).sum();
    let mut acc = 0f64;
    raw.iter()
        .map(|&f| {
            acc += f as f64 + 1.0;
            (((acc / total) * u64::MAX as f64) as u64).clamp(4, u64::MAX - 4)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul64hi_matches_u128_reference() {
        let a = 0xFFFF_FFFF_FFFF_FFFFu64;
        let b = 0x8000_0000_0000_0000u64;
        assert_eq!(mul64hi(a, b), ((a as u128 * b as u128) >> 64) as u64);
    }

    #[test]
    fn encode_decode_roundtrips_fair_bits() {
        let p_half = u64::MAX / 2;
        let bits = [true, false, false, true, true, true, false, false, true, false];
        let mut enc = BacEncoder::new();
        for &b in &bits {
            enc.encode_bit(b, p_half);
        }
        let out_bits = enc.finish();

        let mut packer = BitPacker::new(usize::MAX, None);
        packer.write(out_bits.len() as u64, 16).unwrap();
        for b in &out_bits {
            packer.write(*b as u64, 1).unwrap();
        }
        packer.flush().unwrap();
        let buf = packer.get_buffer().to_vec();
        let mut reader = BitPacker::new(usize::MAX, Some(buf));
        let mut dec = BacDecoder::new(&mut reader).unwrap();
        for &expected in &bits {
            assert_eq!(dec.decode_bit(p_half, &mut reader), expected);
        }
    }

    #[test]
    fn encode_decode_roundtrips_skewed_probability() {
        // p_zero close to 1: encoding an unlikely `true` then mostly `false`s.
        let p_zero = (u64::MAX as f64 * 0.95) as u64;
        let bits = [false, false, true, false, false, false, true, false];
        let mut enc = BacEncoder::new();
        for &b in &bits {
            enc.encode_bit(b, p_zero);
        }
        let out_bits = enc.finish();
        let mut packer = BitPacker::new(usize::MAX, None);
        packer.write(out_bits.len() as u64, 16).unwrap();
        for b in &out_bits {
            packer.write(*b as u64, 1).unwrap();
        }
        packer.flush().unwrap();
        let buf = packer.get_buffer().to_vec();
        let mut reader = BitPacker::new(usize::MAX, Some(buf));
        let mut dec = BacDecoder::new(&mut reader).unwrap();
        for &expected in &bits {
            assert_eq!(dec.decode_bit(p_zero, &mut reader), expected);
        }
    }

    #[test]
    fn gauss_freq_table_is_monotonically_decreasing() {
        let freqs = gauss_freq_bac_64(4, 1.6);
        for w in freqs.windows(2) {
            assert!(w[0] >= w[1]);
        }
    }
}
