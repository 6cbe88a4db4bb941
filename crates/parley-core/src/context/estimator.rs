//! Approximate token estimation.
//!
//! Counts CJK ideographs at 1.5 tokens each and every remaining
//! whitespace-delimited word at one token. No provider tokenizer is
//! involved, so the estimate is cheap enough to run on every message.

use crate::types::Message;

/// First code point of the weighted CJK ideograph range.
const CJK_START: char = '\u{4e00}';

/// Last code point of the weighted CJK ideograph range.
const CJK_END: char = '\u{9fa5}';

/// Whether `c` is counted as a CJK ideograph.
pub fn is_cjk(c: char) -> bool {
    (CJK_START..=CJK_END).contains(&c)
}

/// Estimate the token count of `text`.
///
/// Equivalent to `floor(cjk * 1.5 + words)` where `words` counts the
/// non-empty whitespace-separated tokens left after removing the CJK
/// ideographs. Removed ideographs do not split words: `"ab你cd"` leaves
/// one word, `"abcd"`.
pub fn estimate(text: &str) -> usize {
    let mut cjk = 0usize;
    let mut words = 0usize;
    let mut in_word = false;

    for c in text.chars() {
        if is_cjk(c) {
            cjk += 1;
        } else if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            words += 1;
        }
    }

    cjk * 3 / 2 + words
}

/// Re-estimate the total token count of a message list from content.
///
/// Stored per-message estimates are ignored so a stale value can never
/// leak into the session total.
pub fn estimate_messages(messages: &[Message]) -> usize {
    messages.iter().map(|m| estimate(&m.content)).sum()
}
