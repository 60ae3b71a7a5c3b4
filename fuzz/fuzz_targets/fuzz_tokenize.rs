//! Fuzz target for rule tokenization.
//!
//! Tests that the Python rules handle arbitrary text without panicking and
//! always produce well-formed spans.

#![no_main]

use blocklight::highlight::{RuleSet, tokenize_with};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let rules = RuleSet::python();
    let len = data.chars().count();
    let spans = tokenize_with(&rules, data);

    let mut last_end = 0;
    for span in &spans {
        assert!(span.len > 0);
        assert!(span.offset >= last_end);
        assert!(span.end() <= len);
        assert!(span.text(data).is_some());
        last_end = span.end();
    }
});
