//! Fuzz target for incremental highlighting under arbitrary edits.
//!
//! Applies a sequence of edits with interleaved passes and checks that a
//! final drain leaves every block matching a fresh tokenization.

#![no_main]

use arbitrary::Arbitrary;
use blocklight::highlight::Tokenizer;
use blocklight::{Document, IncrementalHighlighter, RopeDocument, RuleTokenizer};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Insert { at: u16, text: String },
    Remove { at: u16, len: u8 },
    Pass,
    BatchSize(u8),
}

#[derive(Arbitrary, Debug)]
struct Session {
    initial: String,
    ops: Vec<Op>,
}

fuzz_target!(|session: Session| {
    let mut doc = RopeDocument::from_str(&session.initial);
    let mut highlighter = IncrementalHighlighter::python();
    highlighter.request_full_rehighlight(&doc);

    for op in session.ops.into_iter().take(64) {
        match op {
            Op::Insert { at, text } => {
                let edit = doc.insert(usize::from(at), &text);
                highlighter.on_edit(&doc, edit);
            }
            Op::Remove { at, len } => {
                let start = usize::from(at);
                let edit = doc.remove(start..start + usize::from(len));
                highlighter.on_edit(&doc, edit);
            }
            Op::Pass => {
                highlighter.run_batch(&doc);
            }
            Op::BatchSize(size) => highlighter.set_batch_size(usize::from(size)),
        }
    }

    highlighter.drain(&doc);
    let fresh = RuleTokenizer::python();
    for index in 0..doc.block_count() {
        let text = doc.block_text(index).unwrap_or_default();
        assert_eq!(highlighter.spans_for(index), fresh.tokenize_block(&text).as_slice());
    }
});
