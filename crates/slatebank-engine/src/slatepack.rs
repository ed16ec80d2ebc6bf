//! Slatepack block detection.
//!
//! A slatepack travels as a delimited text block, usually hard-wrapped by
//! the sending wallet. The engine's only job is to find the block inside
//! free text, strip the line breaks, and hand the payload to the backend —
//! it never looks inside.

use std::sync::OnceLock;

use regex::Regex;

/// Opening marker of a slatepack block.
pub const BEGIN_MARKER: &str = "BEGINSLATEPACK.";
/// Closing marker of a slatepack block.
pub const END_MARKER: &str = "ENDSLATEPACK.";

fn block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)BEGINSLATEPACK\..*?ENDSLATEPACK\.").expect("static regex is valid")
    })
}

/// Whether the text even claims to carry a slatepack.
#[must_use]
pub fn contains_slatepack(text: &str) -> bool {
    text.contains("BEGINSLATEPACK")
}

/// Extract the first slatepack block, with embedded newlines stripped.
/// Returns `None` when no complete block is present.
#[must_use]
pub fn extract_slatepack(text: &str) -> Option<String> {
    block_regex()
        .find(text)
        .map(|m| m.as_str().replace(['\n', '\r'], ""))
}
