use std::char::REPLACEMENT_CHARACTER;

use serde::Serialize;
use tracing::trace;

/// How a decoded byte sequence was turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    Utf8,
    /// Bytes taken verbatim, one character per byte.
    Latin1,
    Utf16Le,
    Utf16Be,
}

/// Decoded bytes interpreted as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub framing: Framing,
}

/// Interpret raw bytes as text.
///
/// A NUL byte anywhere means UTF-16: little-endian is tried first, then a
/// big-endian pass that keeps only printable ASCII units. When neither looks
/// like text the little-endian result is returned anyway. Without NUL bytes
/// the input is read as UTF-8, falling back to the bytes verbatim.
///
/// This is a guess, not an encoding detector, and it never fails.
pub fn frame(bytes: &[u8]) -> DecodedText {
    if memchr::memchr(0, bytes).is_some() {
        let le = utf16_le(bytes);
        if looks_textual(&le) {
            trace!("framed as utf-16le");
            return DecodedText {
                text: le,
                framing: Framing::Utf16Le,
            };
        }

        let be = utf16_be_printable(bytes);
        if looks_textual(&be) {
            trace!("framed as utf-16be");
            return DecodedText {
                text: be,
                framing: Framing::Utf16Be,
            };
        }

        trace!("utf-16 framing ambiguous, keeping little-endian");
        return DecodedText {
            text: le,
            framing: Framing::Utf16Le,
        };
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => DecodedText {
            text: s.to_string(),
            framing: Framing::Utf8,
        },
        Err(_) => {
            trace!("invalid utf-8, returning bytes verbatim");
            DecodedText {
                text: bytes.iter().map(|&b| b as char).collect(),
                framing: Framing::Latin1,
            }
        }
    }
}

/// Pair bytes into 16-bit units; an odd trailing byte pairs with zero.
#[inline]
fn units(bytes: &[u8]) -> impl Iterator<Item = (u16, u16)> + '_ {
    bytes.chunks(2).map(|pair| {
        let b0 = pair[0] as u16;
        let b1 = pair.get(1).copied().unwrap_or(0) as u16;
        (b0, b1)
    })
}

/// Little-endian assembly, zero units skipped.
fn utf16_le(bytes: &[u8]) -> String {
    let code_units = units(bytes)
        .map(|(b0, b1)| b0 | (b1 << 8))
        .filter(|&u| u != 0);
    char::decode_utf16(code_units)
        .map(|r| r.unwrap_or(REPLACEMENT_CHARACTER))
        .collect()
}

/// Big-endian assembly keeping only printable ASCII units (32..=126).
fn utf16_be_printable(bytes: &[u8]) -> String {
    units(bytes)
        .map(|(b0, b1)| (b0 << 8) | b1)
        .filter(|u| (32..=126).contains(u))
        .map(|u| u as u8 as char)
        .collect()
}

/// Accept a candidate if it holds at least one ASCII alphanumeric,
/// whitespace or hyphen character.
#[inline]
fn looks_textual(text: &str) -> bool {
    text.chars()
        .any(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-')
}
