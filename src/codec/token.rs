//! Token record encoding.
//!
//! Layout, all bit fields least-significant-bit first:
//!
//! ```text
//! header   pos-kind(2) offset(1) real-offset(1) parent(1) payload(1) record-kind(1)
//! body     id                      gamma, non-negative
//!          position data           Range: length | Set: count, deltas
//!          offset                  start (non-negative), length (positive)
//!          real offset             start (signed delta to offset, or non-negative), length
//!          parent                  signed delta to id
//! padding  zero bits to the next byte boundary
//! payload  raw bytes
//! ```
//!
//! Neither the start position nor the encoding mask is stored; the index
//! supplies the start position again when decoding.

use super::bits::{BitReader, BitWriter};
use super::error::{CodecError, Result};
use super::record::{
    EncodingMask, Position, PositionKind, Positions, RecordKind, Span, TokenRecord,
};

/// The seven header bits of an encoded record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub position_kind: PositionKind,
    pub has_offset: bool,
    pub has_real_offset: bool,
    pub has_parent: bool,
    pub has_payload: bool,
    pub record_kind: RecordKind,
}

impl Header {
    pub const BITS: usize = 7;

    fn write(&self, writer: &mut BitWriter) {
        let (first, second) = self.position_kind.to_bits();
        writer.write_bit(first);
        writer.write_bit(second);
        writer.write_bit(self.has_offset);
        writer.write_bit(self.has_real_offset);
        writer.write_bit(self.has_parent);
        writer.write_bit(self.has_payload);
        writer.write_bit(self.record_kind == RecordKind::Reserved);
    }

    fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let first = reader.read_bit()?;
        let second = reader.read_bit()?;
        Ok(Header {
            position_kind: PositionKind::from_bits(first, second),
            has_offset: reader.read_bit()?,
            has_real_offset: reader.read_bit()?,
            has_parent: reader.read_bit()?,
            has_payload: reader.read_bit()?,
            record_kind: if reader.read_bit()? {
                RecordKind::Reserved
            } else {
                RecordKind::PlainToken
            },
        })
    }
}

/// Encoder/decoder bound to one pipeline-wide encoding mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenCodec {
    mask: EncodingMask,
}

impl TokenCodec {
    pub fn new(mask: EncodingMask) -> Self {
        Self { mask }
    }

    pub fn mask(&self) -> EncodingMask {
        self.mask
    }

    pub fn encode(&self, record: &TokenRecord, start: Position) -> Result<Vec<u8>> {
        encode(record, self.mask, start)
    }

    pub fn decode(&self, bytes: &[u8], start: Position) -> Result<TokenRecord> {
        decode(bytes, start)
    }
}

/// Encode `record` for a posting at `start`.
///
/// An optional field is written only when `mask` allows it and the record
/// has it populated.
pub fn encode(record: &TokenRecord, mask: EncodingMask, start: Position) -> Result<Vec<u8>> {
    if record.kind != RecordKind::PlainToken {
        return Err(CodecError::UnsupportedRecordKind);
    }
    record.validate(start)?;

    let offset = record.offset.filter(|_| mask.contains(EncodingMask::OFFSET));
    let real_offset = record
        .real_offset
        .filter(|_| mask.contains(EncodingMask::REAL_OFFSET));
    let parent_id = record.parent_id.filter(|_| mask.contains(EncodingMask::PARENT));
    let payload = record
        .payload
        .as_deref()
        .filter(|_| mask.contains(EncodingMask::PAYLOAD));

    let header = Header {
        position_kind: record.positions.kind(),
        has_offset: offset.is_some(),
        has_real_offset: real_offset.is_some(),
        has_parent: parent_id.is_some(),
        has_payload: payload.is_some(),
        record_kind: record.kind,
    };

    let mut writer = BitWriter::with_capacity(8 + payload.map_or(0, <[u8]>::len));
    header.write(&mut writer);
    writer.write_non_negative(record.id as u64)?;

    match &record.positions {
        Positions::Range { length } => writer.write_positive(*length as u64)?,
        Positions::Set { positions } => {
            writer.write_positive(positions.len() as u64)?;
            // First position is the start position and is implicit
            for pair in positions.windows(2) {
                writer.write_positive((pair[1] - pair[0]) as u64)?;
            }
        }
        Positions::Single | Positions::None => {}
    }

    if let Some(offset) = offset {
        writer.write_non_negative(offset.start as u64)?;
        writer.write_positive(offset.len())?;
    }

    if let Some(real) = real_offset {
        match offset {
            Some(offset) => writer.write_signed(real.start as i64 - offset.start as i64)?,
            None => writer.write_non_negative(real.start as u64)?,
        }
        writer.write_positive(real.len())?;
    }

    if let Some(parent_id) = parent_id {
        writer.write_signed(parent_id as i64 - record.id as i64)?;
    }

    log::trace!(
        "encoded record {} fields in {} bits ({:?})",
        record.id,
        writer.bit_len(),
        header
    );

    match payload {
        Some(bytes) => writer.write_aligned_bytes(bytes),
        None => writer.flush(),
    }

    let bytes = writer.into_bytes();
    log::debug!(
        "encoded record {} at position {}: {} bytes",
        record.id,
        start,
        bytes.len()
    );
    Ok(bytes)
}

/// Read only the header of an encoded record
pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    Header::read(&mut BitReader::new(bytes))
}

/// Decode a record whose posting sits at `start`
pub fn decode(bytes: &[u8], start: Position) -> Result<TokenRecord> {
    let mut reader = BitReader::new(bytes);
    let header = Header::read(&mut reader)?;
    if header.record_kind != RecordKind::PlainToken {
        return Err(CodecError::UnsupportedRecordKind);
    }

    let id = narrow(reader.read_non_negative()?, "record id")?;

    let positions = match header.position_kind {
        PositionKind::Single => Positions::Single,
        PositionKind::None => Positions::None,
        PositionKind::Range => Positions::Range {
            length: narrow(reader.read_positive()?, "range length")?,
        },
        PositionKind::Set => {
            let count = reader.read_positive()?;
            // Every delta costs at least one bit
            let mut positions = Vec::with_capacity(count.min(bytes.len() as u64 * 8) as usize);
            let mut current = start;
            positions.push(current);
            for _ in 1..count {
                let delta = narrow(reader.read_positive()?, "position delta")?;
                current = current
                    .checked_add(delta)
                    .ok_or_else(|| CodecError::out_of_range("position set exceeds 32 bits"))?;
                positions.push(current);
            }
            Positions::Set { positions }
        }
    };

    let offset = if header.has_offset {
        let start = narrow(reader.read_non_negative()?, "offset start")?;
        Some(read_span_end(&mut reader, start, "offset")?)
    } else {
        None
    };

    let real_offset = if header.has_real_offset {
        let real_start = match offset {
            Some(offset) => {
                let delta = reader.read_signed()?;
                let value = (offset.start as i64)
                    .checked_add(delta)
                    .ok_or_else(|| CodecError::out_of_range("real offset delta overflows"))?;
                narrow(value, "real offset start")?
            }
            None => narrow(reader.read_non_negative()?, "real offset start")?,
        };
        Some(read_span_end(&mut reader, real_start, "real offset")?)
    } else {
        None
    };

    let parent_id = if header.has_parent {
        let delta = reader.read_signed()?;
        let value = (id as i64)
            .checked_add(delta)
            .ok_or_else(|| CodecError::out_of_range("parent delta overflows"))?;
        Some(narrow(value, "parent id")?)
    } else {
        None
    };

    // Payload takes every remaining whole byte, so it must be read last
    let payload = if header.has_payload {
        if reader.remaining_bytes() == 0 {
            Some(Vec::new())
        } else {
            Some(reader.read_remaining_bytes()?.to_vec())
        }
    } else {
        None
    };

    log::trace!("decoded record {} at position {} ({:?})", id, start, header);

    Ok(TokenRecord {
        id,
        positions,
        offset,
        real_offset,
        parent_id,
        payload,
        kind: RecordKind::PlainToken,
    })
}

fn read_span_end(reader: &mut BitReader<'_>, start: u32, what: &str) -> Result<Span> {
    let length = reader.read_positive()?;
    let end = (start as u64)
        .checked_add(length - 1)
        .ok_or_else(|| CodecError::out_of_range(format!("{} length overflows", what)))?;
    let end = narrow(end, what)?;
    Ok(Span { start, end })
}

fn narrow<T>(value: T, what: &str) -> Result<u32>
where
    u32: TryFrom<T>,
    T: Copy + std::fmt::Display,
{
    u32::try_from(value)
        .map_err(|_| CodecError::out_of_range(format!("{} {} does not fit in 32 bits", what, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn roundtrip(record: &TokenRecord, mask: EncodingMask, start: Position) -> TokenRecord {
        let bytes = encode(record, mask, start).unwrap();
        decode(&bytes, start).unwrap()
    }

    #[test]
    fn test_minimal_record_bytes() {
        // seven zero header bits, then id 0 as the single bit "1"
        let bytes = encode(&TokenRecord::new(0), EncodingMask::ALL, 0).unwrap();
        assert_eq!(bytes, vec![0x80]);
        assert_eq!(decode(&bytes, 0).unwrap(), TokenRecord::new(0));
    }

    #[test]
    fn test_range_record_bytes() {
        // header 1000000, id 1 -> 010, length 3 -> 011
        let record = TokenRecord::new(1).with_range(3);
        let bytes = encode(&record, EncodingMask::ALL, 10).unwrap();
        assert_eq!(bytes, vec![0x01, 0x19]);
    }

    #[test]
    fn test_range_positions() {
        let record = TokenRecord::new(4).with_range(3);
        let decoded = roundtrip(&record, EncodingMask::ALL, 10);
        assert_eq!(decoded, record);
        assert_eq!(decoded.positions.resolve(10), vec![10, 11, 12]);
        assert_eq!(decoded.positions.bounds(10), Some((10, 12)));
    }

    #[test]
    fn test_set_positions() {
        let record = TokenRecord::new(8).with_set(vec![5, 6, 9, 12]);
        let decoded = roundtrip(&record, EncodingMask::ALL, 5);
        assert_eq!(decoded.positions.resolve(5), vec![5, 6, 9, 12]);
        assert_eq!(decoded, record);

        let single = TokenRecord::new(8).with_set(vec![77]);
        assert_eq!(roundtrip(&single, EncodingMask::ALL, 77), single);
    }

    #[test]
    fn test_single_and_unpositioned() {
        let single = TokenRecord::new(3);
        let decoded = roundtrip(&single, EncodingMask::ALL, 99);
        assert_eq!(decoded.positions.resolve(99), vec![99]);

        let none = TokenRecord::new(3).unpositioned();
        assert_eq!(roundtrip(&none, EncodingMask::ALL, 99), none);
    }

    #[test]
    fn test_real_offset_relative_to_offset() {
        let record = TokenRecord::new(1)
            .with_offset(100, 110)
            .with_real_offset(98, 109);
        assert_eq!(roundtrip(&record, EncodingMask::ALL, 0), record);

        let relative = encode(&record, EncodingMask::ALL, 0).unwrap();
        let header = decode_header(&relative).unwrap();
        assert!(header.has_offset && header.has_real_offset);
    }

    #[test]
    fn test_real_offset_without_offset() {
        let record = TokenRecord::new(1)
            .with_offset(100, 110)
            .with_real_offset(98, 109);
        let decoded = roundtrip(&record, EncodingMask::REAL_OFFSET, 0);
        assert_eq!(decoded.offset, None);
        assert_eq!(decoded.real_offset, Some(Span::new(98, 109)));

        let only_real = TokenRecord::new(1).with_real_offset(0, 0);
        assert_eq!(roundtrip(&only_real, EncodingMask::ALL, 0), only_real);
    }

    #[test]
    fn test_parent_delta_sign() {
        let below = TokenRecord::new(50).with_parent(47);
        assert_eq!(roundtrip(&below, EncodingMask::ALL, 0), below);

        let above = TokenRecord::new(50).with_parent(80);
        assert_eq!(roundtrip(&above, EncodingMask::ALL, 0), above);

        let same = TokenRecord::new(50).with_parent(50);
        assert_eq!(roundtrip(&same, EncodingMask::ALL, 0), same);

        let far = TokenRecord::new(0).with_parent(u32::MAX);
        assert_eq!(roundtrip(&far, EncodingMask::ALL, 0), far);
    }

    #[test]
    fn test_payload_is_trailing_bytes() {
        let record = TokenRecord::new(0).with_payload(vec![0xAA, 0xBB]);
        let bytes = encode(&record, EncodingMask::ALL, 0).unwrap();
        assert_eq!(bytes, vec![0xA0, 0xAA, 0xBB]);
        assert_eq!(decode(&bytes, 0).unwrap(), record);

        // Payload that looks like gamma codes is still taken verbatim
        let record = TokenRecord::new(12345)
            .with_range(4)
            .with_offset(3, 9)
            .with_parent(12)
            .with_payload(vec![0x00, 0xFF, 0x80, 0x01]);
        assert_eq!(roundtrip(&record, EncodingMask::ALL, 7), record);
    }

    #[test]
    fn test_empty_payload_distinct_from_absent() {
        let empty = TokenRecord::new(0).with_payload(Vec::new());
        let with_flag = encode(&empty, EncodingMask::ALL, 0).unwrap();
        let without_flag = encode(&empty, EncodingMask::NONE, 0).unwrap();

        assert_eq!(with_flag, vec![0xA0]);
        assert_eq!(without_flag, vec![0x80]);
        assert_eq!(decode(&with_flag, 0).unwrap().payload, Some(Vec::new()));
        assert_eq!(decode(&without_flag, 0).unwrap().payload, None);
    }

    #[test]
    fn test_mask_filters_fields() {
        let record = TokenRecord::new(10)
            .with_offset(1, 5)
            .with_real_offset(1, 5)
            .with_parent(3)
            .with_payload(vec![1]);

        for bits in 0..=0b1111u8 {
            let mask = EncodingMask(bits);
            let decoded = roundtrip(&record, mask, 0);
            assert_eq!(decoded, record.restricted_to(mask), "mask {}", mask);

            let header = decode_header(&encode(&record, mask, 0).unwrap()).unwrap();
            assert_eq!(header.has_offset, mask.contains(EncodingMask::OFFSET));
            assert_eq!(header.has_payload, mask.contains(EncodingMask::PAYLOAD));
        }
    }

    #[test]
    fn test_unset_fields_not_emitted() {
        let bytes = encode(&TokenRecord::new(0), EncodingMask::ALL, 0).unwrap();
        let header = decode_header(&bytes).unwrap();
        assert!(!header.has_offset);
        assert!(!header.has_real_offset);
        assert!(!header.has_parent);
        assert!(!header.has_payload);
    }

    #[test]
    fn test_invalid_record_rejected() {
        let err = encode(&TokenRecord::new(1).with_range(0), EncodingMask::ALL, 0).unwrap_err();
        assert!(matches!(err, CodecError::InvalidRecord(_)));

        let err = encode(&TokenRecord::new(1).with_set(vec![3, 4]), EncodingMask::ALL, 0).unwrap_err();
        assert!(matches!(err, CodecError::InvalidRecord(_)));
    }

    #[test]
    fn test_reserved_record_kind() {
        let mut record = TokenRecord::new(1);
        record.kind = RecordKind::Reserved;
        assert_eq!(
            encode(&record, EncodingMask::ALL, 0),
            Err(CodecError::UnsupportedRecordKind)
        );

        // record-kind is bit 6 of the first byte
        let bytes = [0b1100_0000u8];
        assert_eq!(decode(&bytes, 0), Err(CodecError::UnsupportedRecordKind));
        assert_eq!(decode_header(&bytes).unwrap().record_kind, RecordKind::Reserved);
    }

    #[test]
    fn test_truncated_input() {
        assert!(matches!(decode(&[], 0), Err(CodecError::ExhaustedInput { .. })));

        let record = TokenRecord::new(1000).with_set(vec![0, 100, 1000]).with_offset(5, 50);
        let bytes = encode(&record, EncodingMask::ALL, 0).unwrap();
        for len in 0..bytes.len() {
            assert!(
                matches!(decode(&bytes[..len], 0), Err(CodecError::ExhaustedInput { .. })),
                "prefix of {} bytes should be exhausted",
                len
            );
        }
    }

    #[test]
    fn test_codec_value() {
        let codec = TokenCodec::new(EncodingMask::OFFSET | EncodingMask::PARENT);
        assert_eq!(codec.mask(), EncodingMask::OFFSET | EncodingMask::PARENT);

        let record = TokenRecord::new(9).with_offset(2, 3).with_payload(vec![5]);
        let bytes = codec.encode(&record, 0).unwrap();
        let decoded = codec.decode(&bytes, 0).unwrap();
        assert_eq!(decoded, record.restricted_to(codec.mask()));
        assert_eq!(decoded.payload, None);
    }

    fn random_record(rng: &mut StdRng, start: Position) -> TokenRecord {
        let mut record = TokenRecord::new(rng.gen_range(0..100_000));
        record.positions = match rng.gen_range(0..4) {
            0 => Positions::Single,
            1 => Positions::Range {
                length: rng.gen_range(1..500),
            },
            2 => {
                let mut positions = vec![start];
                for _ in 0..rng.gen_range(0..20) {
                    let last = *positions.last().unwrap();
                    positions.push(last + rng.gen_range(1..1000));
                }
                Positions::Set { positions }
            }
            _ => Positions::None,
        };
        if rng.gen_bool(0.7) {
            let begin = rng.gen_range(0..1_000_000);
            record.offset = Some(Span::new(begin, begin + rng.gen_range(0..200)));
        }
        if rng.gen_bool(0.5) {
            let begin = rng.gen_range(0..1_000_000);
            record.real_offset = Some(Span::new(begin, begin + rng.gen_range(0..200)));
        }
        if rng.gen_bool(0.5) {
            record.parent_id = Some(rng.gen_range(0..200_000));
        }
        if rng.gen_bool(0.4) {
            let len = rng.gen_range(0..16);
            record.payload = Some((0..len).map(|_| rng.r#gen::<u8>()).collect());
        }
        record
    }

    #[test]
    fn test_random_roundtrip() {
        let mut rng = StdRng::seed_from_u64(0x7e57);
        for _ in 0..5000 {
            let start = rng.gen_range(0..1_000_000);
            let record = random_record(&mut rng, start);
            let mask = EncodingMask(rng.gen_range(0..=0b1111));
            let decoded = roundtrip(&record, mask, start);
            assert_eq!(decoded, record.restricted_to(mask));
        }
    }

    #[test]
    fn test_random_bytes_never_panic() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20_000 {
            let len = rng.gen_range(0..24);
            let bytes: Vec<u8> = (0..len).map(|_| rng.r#gen::<u8>()).collect();
            let _ = decode(&bytes, rng.r#gen());
        }
    }
}
