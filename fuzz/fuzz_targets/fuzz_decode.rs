#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u32, &[u8])| {
    // Decoding arbitrary bytes must fail cleanly, never panic
    let (start, data) = input;
    let _ = tokpack::codec::decode(data, start);
    let _ = tokpack::codec::decode_header(data);
    for entry in tokpack::postings::PayloadBlockReader::new(data) {
        let _ = entry;
    }
});
