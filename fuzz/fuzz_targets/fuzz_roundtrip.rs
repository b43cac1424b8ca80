#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tokpack::codec::{decode, encode, EncodingMask, Positions, Span, TokenRecord};

#[derive(Debug, Arbitrary)]
struct Input {
    id: u32,
    start: u32,
    shape: u8,
    range_length: u32,
    deltas: Vec<u16>,
    offset: Option<(u32, u16)>,
    real_offset: Option<(u32, u16)>,
    parent_id: Option<u32>,
    payload: Option<Vec<u8>>,
    mask: u8,
}

fuzz_target!(|input: Input| {
    let positions = match input.shape % 4 {
        0 => Positions::Single,
        1 => Positions::Range { length: input.range_length },
        2 => {
            let mut positions = vec![input.start];
            for delta in input.deltas {
                let last = *positions.last().unwrap();
                match last.checked_add(delta as u32) {
                    Some(next) => positions.push(next),
                    None => break,
                }
            }
            Positions::Set { positions }
        }
        _ => Positions::None,
    };
    let span = |(start, len): (u32, u16)| Span::new(start, start.saturating_add(len as u32));

    let mut record = TokenRecord::new(input.id);
    record.positions = positions;
    record.offset = input.offset.map(span);
    record.real_offset = input.real_offset.map(span);
    record.parent_id = input.parent_id;
    record.payload = input.payload;

    let mask = EncodingMask(input.mask & EncodingMask::ALL.0);

    // Invalid records (zero-length ranges, repeated set positions) are rejected up front
    if let Ok(bytes) = encode(&record, mask, input.start) {
        let decoded = decode(&bytes, input.start).expect("encoded record must decode");
        assert_eq!(decoded, record.restricted_to(mask));
    }
});
