//! Bit-granular I/O over plain byte buffers.
//!
//! Bits are packed least-significant first: the first bit written lands in
//! bit 0 of the first byte, the ninth bit in bit 0 of the second byte.
//! A partially filled trailing byte is right-padded with zero bits when the
//! writer is flushed.

use super::error::{CodecError, Result};

/// Accumulates individual bits into an owned byte buffer.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Bits of the byte being assembled (low `pending` bits are valid)
    current: u8,
    /// Number of bits in `current`, always < 8
    pending: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            current: 0,
            pending: 0,
        }
    }

    /// Write a single bit
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        if bit {
            self.current |= 1 << self.pending;
        }
        self.pending += 1;
        if self.pending == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.pending = 0;
        }
    }

    /// Write the `count` lowest-order bits of `value`, least significant first
    pub fn write_bits(&mut self, value: u64, count: u32) {
        debug_assert!(count <= 64);
        for i in 0..count {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    /// Pad a partial byte with zero bits and append it. No-op when aligned.
    pub fn flush(&mut self) {
        if self.pending > 0 {
            self.bytes.push(self.current);
            self.current = 0;
            self.pending = 0;
        }
    }

    /// Flush, then append raw bytes verbatim
    pub fn write_aligned_bytes(&mut self, data: &[u8]) {
        self.flush();
        self.bytes.extend_from_slice(data);
    }

    /// Total number of bits written so far (excluding padding)
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.pending as usize
    }

    /// Whether the next bit starts a new byte
    pub fn is_aligned(&self) -> bool {
        self.pending == 0
    }

    /// Completed bytes only; a pending partial byte is not included
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Flush and return the produced bytes
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.flush();
        self.bytes
    }
}

/// Reads bits back in the order [`BitWriter`] produced them.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Absolute bit cursor
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Read a single bit
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        let byte = self.position / 8;
        match self.data.get(byte) {
            Some(&b) => {
                let bit = (b >> (self.position % 8)) & 1 == 1;
                self.position += 1;
                Ok(bit)
            }
            None => Err(CodecError::ExhaustedInput {
                bit_offset: self.position,
            }),
        }
    }

    /// Read `count` bits into the low-order bits of the result, least significant first
    pub fn read_bits(&mut self, count: u32) -> Result<u64> {
        debug_assert!(count <= 64);
        let mut value = 0u64;
        for i in 0..count {
            if self.read_bit()? {
                value |= 1 << i;
            }
        }
        Ok(value)
    }

    /// Consume and return every whole byte after the current one.
    ///
    /// Unread bits of a partially consumed byte are skipped; they are the
    /// writer's flush padding.
    pub fn read_remaining_bytes(&mut self) -> Result<&'a [u8]> {
        let start = self.aligned_byte();
        if start >= self.data.len() {
            return Err(CodecError::ExhaustedInput {
                bit_offset: self.position,
            });
        }
        self.position = self.data.len() * 8;
        Ok(&self.data[start..])
    }

    /// Number of whole bytes [`read_remaining_bytes`](Self::read_remaining_bytes) would return
    pub fn remaining_bytes(&self) -> usize {
        self.data.len().saturating_sub(self.aligned_byte())
    }

    /// Current bit cursor
    pub fn bit_position(&self) -> usize {
        self.position
    }

    fn aligned_byte(&self) -> usize {
        self.position.div_ceil(8)
    }
}
