//! Fuzz target for the streaming redactor.
//!
//! Splits arbitrary input into arbitrary chunks and checks that the
//! `RedactingWriter` output matches redacting the whole buffer at once.

#![no_main]

use std::io::Write;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rosa_redact::{redact, RedactingWriter};

#[derive(Debug, Arbitrary)]
struct Input {
    text: String,
    chunk_sizes: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let mut out = Vec::new();
    {
        let mut writer = RedactingWriter::new(&mut out);
        let mut rest = input.text.as_bytes();
        let mut sizes = input.chunk_sizes.iter().copied().cycle();
        while !rest.is_empty() {
            let size = usize::from(sizes.next().unwrap_or(u8::MAX)).clamp(1, rest.len());
            let (chunk, tail) = rest.split_at(size);
            writer.write_all(chunk).unwrap();
            rest = tail;
        }
        writer.finish().unwrap();
    }

    let streamed = String::from_utf8(out).unwrap();
    assert_eq!(streamed, redact(&input.text));
});
