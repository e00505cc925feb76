//! Pre-flight token estimate.

/// Tokens added to every request for the system prompt and response framing.
pub const FIXED_OVERHEAD_TOKENS: u64 = 150;

/// Rough characters-per-token ratio for English text and code.
const CHARS_PER_TOKEN: u64 = 4;

/// Estimate the tokens a message will cost: `ceil(chars / 4) + 1 + 150`.
///
/// Counts Unicode scalar values, not bytes, so the estimate depends only on
/// the text length.
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    chars.div_ceil(CHARS_PER_TOKEN) + 1 + FIXED_OVERHEAD_TOKENS
}
