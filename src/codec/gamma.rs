//! Elias-gamma variable-length integers on top of [`BitWriter`] / [`BitReader`].
//!
//! A positive `v` with `k = floor(log2 v)` is written as `k` zero bits, a
//! terminating one bit, then the `k` bits below the leading one, most
//! significant first. Small values are cheap: 1 costs one bit, 2..=3 three
//! bits, 4..=7 five bits.
//!
//! Non-negative values are shifted by one. Signed values fold the sign into
//! parity: `0 -> 1, -1 -> 2, 1 -> 3, -2 -> 4, 2 -> 5, ...`

use super::bits::{BitReader, BitWriter};
use super::error::{CodecError, Result};

/// Number of bits the gamma code of `value` occupies
pub fn gamma_len(value: u64) -> u32 {
    debug_assert!(value > 0);
    2 * value.ilog2() + 1
}

impl BitWriter {
    /// Write a strictly positive integer
    pub fn write_positive(&mut self, value: u64) -> Result<()> {
        if value == 0 {
            return Err(CodecError::out_of_range("gamma code requires a positive value"));
        }
        let k = value.ilog2();
        for _ in 0..k {
            self.write_bit(false);
        }
        self.write_bit(true);
        for i in (0..k).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Write an integer >= 0
    pub fn write_non_negative(&mut self, value: u64) -> Result<()> {
        let shifted = value
            .checked_add(1)
            .ok_or_else(|| CodecError::out_of_range(format!("{} exceeds the non-negative range", value)))?;
        self.write_positive(shifted)
    }

    /// Write a signed integer (odd codes are >= 0, even codes negative)
    pub fn write_signed(&mut self, value: i64) -> Result<()> {
        let code = if value >= 0 {
            (value as u64) * 2 + 1
        } else {
            value
                .unsigned_abs()
                .checked_mul(2)
                .ok_or_else(|| CodecError::out_of_range(format!("{} exceeds the signed range", value)))?
        };
        self.write_positive(code)
    }
}

impl BitReader<'_> {
    /// Read a strictly positive integer
    pub fn read_positive(&mut self) -> Result<u64> {
        let mut k = 0u32;
        while !self.read_bit()? {
            k += 1;
            if k > 63 {
                return Err(CodecError::out_of_range("gamma prefix longer than 63 bits"));
            }
        }

        let mut value = 1u64;
        for _ in 0..k {
            value = (value << 1) | self.read_bit()? as u64;
        }
        Ok(value)
    }

    /// Read an integer >= 0
    pub fn read_non_negative(&mut self) -> Result<u64> {
        Ok(self.read_positive()? - 1)
    }

    /// Read a signed integer
    pub fn read_signed(&mut self) -> Result<i64> {
        let code = self.read_positive()?;
        if code % 2 == 0 {
            Ok(-((code / 2) as i64))
        } else {
            Ok(((code - 1) / 2) as i64)
        }
    }
}
