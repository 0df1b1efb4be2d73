//! Fuzz target for whole-buffer redaction.
//!
//! Tests that `redact` handles arbitrary input without panicking and that a
//! second pass over its output changes nothing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rosa_redact::{redact, Redactor};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let once = redact(&text);
    let twice = redact(&once);
    assert_eq!(once, twice, "redaction is not idempotent");

    // The report must agree with the plain pass
    let report = Redactor::global().redact_with_report(&text);
    assert_eq!(report.output.as_str(), once);
    assert_eq!(report.was_modified, once != text);
});
