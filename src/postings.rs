//! Postings payload blocks.
//!
//! A block holds the encoded token records of one term's postings, in
//! posting order. Each entry is framed as:
//!
//! - varint: start position delta from the previous entry (first entry: from 0)
//! - varint: encoded record length in bytes
//! - the encoded record
//!
//! The start position recovered from the framing is the context the record
//! decoder needs, so a block is self-sufficient given the encoding mask.

use crate::codec::{self, CodecError, EncodingMask, Position, TokenCodec, TokenRecord};
use crate::utils::{decode_varint, encode_varint};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Builds a postings payload block one entry at a time
pub struct PayloadBlockWriter {
    codec: TokenCodec,
    buf: Vec<u8>,
    last_start: Position,
    entries: usize,
}

impl PayloadBlockWriter {
    pub fn new(mask: EncodingMask) -> Self {
        Self {
            codec: TokenCodec::new(mask),
            buf: Vec::new(),
            last_start: 0,
            entries: 0,
        }
    }

    /// Encode `record` and append it as the posting at `start`
    pub fn add(&mut self, start: Position, record: &TokenRecord) -> codec::Result<()> {
        self.check_order(start)?;
        let encoded = self.codec.encode(record, start)?;
        self.push_encoded(start, &encoded);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn finish(self) -> Vec<u8> {
        log::debug!(
            "finished payload block: {} entries, {} bytes (mask {})",
            self.entries,
            self.buf.len(),
            self.codec.mask()
        );
        self.buf
    }

    fn check_order(&self, start: Position) -> codec::Result<()> {
        if self.entries > 0 && start < self.last_start {
            return Err(out_of_order(start, self.last_start));
        }
        Ok(())
    }

    fn push_encoded(&mut self, start: Position, encoded: &[u8]) {
        encode_varint(start - self.last_start, &mut self.buf);
        encode_varint(encoded.len() as u32, &mut self.buf);
        self.buf.extend_from_slice(encoded);
        self.last_start = start;
        self.entries += 1;
    }
}

fn out_of_order(start: Position, previous: Position) -> CodecError {
    CodecError::InvalidRecord(format!(
        "posting start position {} precedes previous position {}",
        start, previous
    ))
}

/// Encode a whole block at once.
///
/// Records are encoded independently (in parallel with the `parallel`
/// feature) and framed in input order, so the output matches a sequence of
/// [`PayloadBlockWriter::add`] calls.
pub fn encode_block(mask: EncodingMask, entries: &[(Position, TokenRecord)]) -> codec::Result<Vec<u8>> {
    if let Some(pair) = entries.windows(2).find(|pair| pair[1].0 < pair[0].0) {
        return Err(out_of_order(pair[1].0, pair[0].0));
    }

    let mut writer = PayloadBlockWriter::new(mask);
    let token_codec = writer.codec;

    #[cfg(feature = "parallel")]
    let encoded: Vec<Vec<u8>> = entries
        .par_iter()
        .map(|(start, record)| token_codec.encode(record, *start))
        .collect::<codec::Result<_>>()?;

    #[cfg(not(feature = "parallel"))]
    let encoded: Vec<Vec<u8>> = entries
        .iter()
        .map(|(start, record)| token_codec.encode(record, *start))
        .collect::<codec::Result<_>>()?;

    for ((start, _), bytes) in entries.iter().zip(&encoded) {
        writer.push_encoded(*start, bytes);
    }
    Ok(writer.finish())
}

/// Iterates the `(start position, record)` entries of a block
pub struct PayloadBlockReader<'a> {
    data: &'a [u8],
    pos: usize,
    last_start: Position,
}

impl<'a> PayloadBlockReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            last_start: 0,
        }
    }

    fn read_entry(&mut self) -> codec::Result<(Position, TokenRecord)> {
        let delta = self.read_varint()?;
        let start = self
            .last_start
            .checked_add(delta)
            .ok_or_else(|| CodecError::ValueOutOfRange("posting start position exceeds 32 bits".to_string()))?;
        let len = self.read_varint()? as usize;

        let end = self.pos.checked_add(len).filter(|&end| end <= self.data.len()).ok_or(
            CodecError::ExhaustedInput {
                bit_offset: self.data.len() * 8,
            },
        )?;
        let record = codec::decode(&self.data[self.pos..end], start)?;

        self.pos = end;
        self.last_start = start;
        Ok((start, record))
    }

    fn read_varint(&mut self) -> codec::Result<u32> {
        let (value, consumed) =
            decode_varint(&self.data[self.pos..]).ok_or(CodecError::ExhaustedInput {
                bit_offset: self.pos * 8,
            })?;
        self.pos += consumed;
        Ok(value)
    }
}

impl Iterator for PayloadBlockReader<'_> {
    type Item = codec::Result<(Position, TokenRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let entry = self.read_entry();
        if entry.is_err() {
            // Framing is unreliable after an error
            self.pos = self.data.len();
        }
        Some(entry)
    }
}
