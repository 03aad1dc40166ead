//! MSB-first bit packer over a byte buffer (§4.6).
//!
//! The host word is `u64` (the `USE_64BIT_PACKER` branch of
//! `original_source/src/utils/entropy/packer.c`): complete 64-bit words
//! are flushed to the byte buffer in big-endian order as soon as enough
//! bits have accumulated, and [`BitPacker::flush`] pads any final partial
//! word out to a byte boundary rather than a full word, since the wire
//! format itself is only byte-aligned. This is the single packer used
//! directly by the Huffman coder, the arithmetic coder, and the entropy
//! dispatcher — the duplicated packer/entropy-coder file pair in the
//! original source collapses to this one type.

/// Errors produced by [`BitPacker`] operations.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum PackerError {
    #[error("bit width {0} is out of range (must be 1..=32)")]
    InvalidBitWidth(u32),
    #[error("write would exceed the packer's configured bit capacity")]
    OutOfSpace,
}

/// A MSB-first bit packer backed by a growable byte buffer, or a caller-
/// supplied buffer when decoding an existing stream.
pub struct BitPacker {
    buffer: Vec<u8>,
    max_bits: usize,
    /// Bits already consumed by [`BitPacker::read`] / [`BitPacker::peek`].
    read_cursor: usize,
    /// Pending bits not yet flushed to `buffer`, oldest bit in the
    /// highest position of the `acc_bits`-wide value.
    acc: u128,
    acc_bits: u32,
}

impl BitPacker {
    /// `max_bits` bounds total bits ever written (`usize::MAX` for
    /// "unbounded"). `external` seeds the buffer, e.g. to wrap an
    /// already-received byte stream for reading.
    pub fn new(max_bits: usize, external: Option<Vec<u8>>) -> Self {
        BitPacker { buffer: external.unwrap_or_default(), max_bits, read_cursor: 0, acc: 0, acc_bits: 0 }
    }

    /// Write the low `nbits` bits of `value`, most-significant bit first.
    /// `nbits` is capped at 32 per call, matching `write_bits`'s `UINT32`
    /// value parameter in `original_source/src/utils/entropy/packer.c`
    /// (masked with `0xFFFFFFFF >> (32-bits)`) even in the 64-bit-word
    /// packer build; wider values are written as multiple calls.
    pub fn write(&mut self, value: u64, nbits: u32) -> Result<(), PackerError> {
        if nbits == 0 {
            return Ok(());
        }
        if nbits > 32 {
            return Err(PackerError::InvalidBitWidth(nbits));
        }
        if self.total_written_bits() + nbits as usize > self.max_bits {
            return Err(PackerError::OutOfSpace);
        }
        let masked = value & ((1u64 << nbits) - 1);
        self.acc = (self.acc << nbits) | masked as u128;
        self.acc_bits += nbits;
        while self.acc_bits >= 64 {
            let shift = self.acc_bits - 64;
            let word = (self.acc >> shift) as u64;
            self.buffer.extend_from_slice(&word.to_be_bytes());
            self.acc_bits -= 64;
            self.acc &= (1u128 << self.acc_bits) - 1;
        }
        Ok(())
    }

    fn total_written_bits(&self) -> usize {
        self.buffer.len() * 8 + self.acc_bits as usize
    }

    /// Pad any pending partial word out to a byte boundary and flush it.
    /// A no-op if the packer is already byte-aligned.
    pub fn flush(&mut self) -> Result<(), PackerError> {
        if self.acc_bits == 0 {
            return Ok(());
        }
        let pad = (8 - self.acc_bits % 8) % 8;
        if pad != 0 {
            self.acc <<= pad;
            self.acc_bits += pad;
        }
        let nbytes = (self.acc_bits / 8) as usize;
        let bytes = self.acc.to_be_bytes();
        self.buffer.extend_from_slice(&bytes[16 - nbytes..]);
        self.acc = 0;
        self.acc_bits = 0;
        Ok(())
    }

    fn readable_bits(&self) -> usize {
        self.buffer.len() * 8
    }

    /// Read `nbits` bits, most-significant bit first, advancing the read
    /// cursor. Only bits already flushed into the byte buffer are
    /// visible; call [`BitPacker::flush`] first if writes and reads are
    /// interleaved on the same packer. Bits requested past the end of the
    /// declared payload read back as zero rather than failing, so a
    /// decoder that needs to look one step beyond the logical end of a
    /// stream (the arithmetic coder's final flush, for instance) doesn't
    /// need to special-case it.
    pub fn read(&mut self, nbits: u32) -> Result<u64, PackerError> {
        let v = self.peek(nbits)?;
        self.read_cursor += nbits as usize;
        Ok(v)
    }

    /// Like [`BitPacker::read`] but does not advance the cursor. `nbits`
    /// is capped at 32 per call, matching [`BitPacker::write`].
    pub fn peek(&self, nbits: u32) -> Result<u64, PackerError> {
        if nbits == 0 {
            return Ok(0);
        }
        if nbits > 32 {
            return Err(PackerError::InvalidBitWidth(nbits));
        }
        let mut result: u64 = 0;
        for i in 0..nbits as usize {
            let pos = self.read_cursor + i;
            let bit = if pos < self.readable_bits() {
                let byte = self.buffer[pos / 8];
                (byte >> (7 - pos % 8)) & 1
            } else {
                0
            };
            result = (result << 1) | bit as u64;
        }
        Ok(result)
    }

    /// The packed byte buffer built so far (any pending partial word is
    /// not included until [`BitPacker::flush`] is called).
    pub fn get_buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn bits_remaining_to_read(&self) -> usize {
        self.readable_bits().saturating_sub(self.read_cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_roundtrips_values() {
        let mut p = BitPacker::new(usize::MAX, None);
        p.write(0b101, 3).unwrap();
        p.write(0xABCD, 16).unwrap();
        p.write(1, 1).unwrap();
        p.flush().unwrap();

        let buf = p.get_buffer().to_vec();
        let mut r = BitPacker::new(usize::MAX, Some(buf));
        assert_eq!(r.read(3).unwrap(), 0b101);
        assert_eq!(r.read(16).unwrap(), 0xABCD);
        assert_eq!(r.read(1).unwrap(), 1);
    }

    #[test]
    fn full_word_flushes_immediately_without_explicit_flush() {
        let mut p = BitPacker::new(usize::MAX, None);
        p.write(0x01234567, 32).unwrap();
        p.write(0x89ABCDEF, 32).unwrap();
        assert_eq!(p.get_buffer(), &0x0123456789ABCDEFu64.to_be_bytes());
    }

    #[test]
    fn write_above_32_bits_is_rejected() {
        let mut p = BitPacker::new(usize::MAX, None);
        assert_eq!(p.write(0, 33), Err(PackerError::InvalidBitWidth(33)));
    }

    #[test]
    fn flush_pads_to_byte_not_word() {
        let mut p = BitPacker::new(usize::MAX, None);
        p.write(0b1, 1).unwrap();
        p.flush().unwrap();
        assert_eq!(p.get_buffer().len(), 1);
        assert_eq!(p.get_buffer()[0], 0b1000_0000);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut p = BitPacker::new(usize::MAX, None);
        p.write(0xFF, 8).unwrap();
        p.flush().unwrap();
        let buf = p.get_buffer().to_vec();
        let r = BitPacker::new(usize::MAX, Some(buf));
        assert_eq!(r.peek(4).unwrap(), 0xF);
        assert_eq!(r.peek(4).unwrap(), 0xF);
    }

    #[test]
    fn out_of_space_is_rejected() {
        let mut p = BitPacker::new(4, None);
        assert_eq!(p.write(0xF, 5), Err(PackerError::OutOfSpace));
    }

    #[test]
    fn reading_past_end_zero_pads() {
        let mut r = BitPacker::new(usize::MAX, Some(vec![0xFF]));
        assert_eq!(r.read(8).unwrap(), 0xFF);
        assert_eq!(r.read(4).unwrap(), 0);
        assert_eq!(r.bits_remaining_to_read(), 0);
    }
}
