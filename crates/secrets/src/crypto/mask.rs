//! Display masking for decrypted secret values.
//!
//! Masking is a pure function of the plaintext and is computed on read for
//! UI display; the masked form is never persisted and never stands in for
//! the stored ciphertext.

/// Character used for redacted positions.
const MASK_CHAR: char = '•';

/// Number of leading and trailing characters left visible for long values.
const VISIBLE: usize = 4;

/// Width of the fixed placeholder returned for short values.
const PLACEHOLDER_LEN: usize = 8;

/// Mask a plaintext secret for display.
///
/// Values of [`PLACEHOLDER_LEN`] characters or fewer collapse to a fixed
/// placeholder, so short secrets do not leak their length. Longer values keep
/// their first and last [`VISIBLE`] characters with one mask character per
/// hidden character in between; for these the exact length stays visible.
pub fn mask(plaintext: &str) -> String {
    let len = plaintext.chars().count();
    if len <= PLACEHOLDER_LEN {
        return MASK_CHAR.to_string().repeat(PLACEHOLDER_LEN);
    }

    let mut masked = String::with_capacity(plaintext.len() + MASK_CHAR.len_utf8() * len);
    masked.extend(plaintext.chars().take(VISIBLE));
    for _ in 0..len - 2 * VISIBLE {
        masked.push(MASK_CHAR);
    }
    masked.extend(plaintext.chars().skip(len - VISIBLE));
    masked
}
