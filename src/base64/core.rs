use std::borrow::Cow;

use tracing::trace;

use super::error::DecodeError;

const BASE64_ENGINE: &base64_simd::Base64 = &base64_simd::STANDARD;

/// Share of alphabet characters below which input is not treated as Base64.
pub const MIN_ALPHABET_RATIO: f64 = 0.8;

/// Check if a character is a valid base64 alphabet character or padding.
#[inline]
pub fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='
}

/// Remove every whitespace character. Borrows when there is nothing to strip.
pub fn strip_whitespace(text: &str) -> Cow<'_, str> {
    // Quick check with SIMD memchr for the usual suspects (wrapped lines,
    // copied spaces), then a full scan for any other whitespace.
    if memchr::memchr3(b'\n', b' ', b'\r', text.as_bytes()).is_none()
        && !text.chars().any(char::is_whitespace)
    {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.chars().filter(|c| !c.is_whitespace()).collect())
}

/// Fraction of characters of the trimmed text that belong to the Base64
/// alphabet. Interior blanks count as non-alphabet characters, so prose
/// separated by spaces scores low while line-wrapped Base64 barely moves.
/// With blanks stripped first, `"not base64 at all!!"` would score 0.875 and
/// pass; the cost is that Base64 broken by a space every few characters is
/// rejected. Empty input scores 0.
pub fn alphabet_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut hits = 0usize;
    for c in text.trim().chars() {
        total += 1;
        if is_base64_char(c) {
            hits += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    hits as f64 / total as f64
}

/// Reject input whose alphabet ratio is below `min_ratio`.
pub fn check_plausible(text: &str, min_ratio: f64) -> Result<(), DecodeError> {
    let ratio = alphabet_ratio(text);
    trace!(ratio, "base64 alphabet ratio");
    if ratio < min_ratio {
        return Err(DecodeError::NotBase64 { ratio });
    }
    Ok(())
}

/// Repair a selection before decoding: strip whitespace, drop an incomplete
/// trailing group when the input is not already padded, then pad with `=`
/// to a multiple of four characters. Never fails.
pub fn normalize(raw: &str) -> String {
    let cleaned = strip_whitespace(raw);
    let len = cleaned.chars().count();
    let rem = len % 4;

    let mut out = if rem != 0 && !cleaned.ends_with('=') {
        trace!(dropped = rem, "dropping incomplete trailing group");
        let keep = len - rem;
        let end = cleaned
            .char_indices()
            .nth(keep)
            .map(|(i, _)| i)
            .unwrap_or(cleaned.len());
        cleaned[..end].to_string()
    } else {
        cleaned.into_owned()
    };

    let mut len = out.chars().count();
    while len % 4 != 0 {
        out.push('=');
        len += 1;
    }
    out
}

/// The raw decode primitive, with the leniency of the browser `atob`:
/// ASCII whitespace is ignored, padding is optional, and nonzero trailing
/// bits in the last group are accepted.
fn decode_primitive(data: &str) -> Option<Vec<u8>> {
    base64_simd::forgiving_decode_to_vec(data.as_bytes()).ok()
}

/// Decode a candidate into raw bytes.
///
/// Fails with [`DecodeError::NotBase64`] when less than
/// [`MIN_ALPHABET_RATIO`] of the trimmed input is alphabet characters
/// (see [`alphabet_ratio`]), and with [`DecodeError::InvalidBase64`] when the decode
/// primitive rejects the input.
pub fn decode_base64(candidate: &str) -> Result<Vec<u8>, DecodeError> {
    check_plausible(candidate, MIN_ALPHABET_RATIO)?;
    decode_unchecked(candidate)
}

/// Decode without the alphabet-ratio check.
pub(crate) fn decode_unchecked(candidate: &str) -> Result<Vec<u8>, DecodeError> {
    decode_primitive(candidate).ok_or(DecodeError::InvalidBase64)
}

/// Encode bytes with the standard padded alphabet.
pub fn encode_base64(data: &[u8]) -> String {
    BASE64_ENGINE.encode_to_string(data)
}

/// Round-trip check: `s` is Base64 iff decoding it and re-encoding the bytes
/// reproduces `s` exactly. The empty string passes.
pub fn is_valid_base64(s: &str) -> bool {
    // Canonical encodings are pure alphabet, length a multiple of four.
    if s.len() % 4 != 0 || !s.bytes().all(|b| is_base64_char(b as char)) {
        return false;
    }
    match decode_primitive(s) {
        Some(bytes) => encode_base64(&bytes) == s,
        None => false,
    }
}
