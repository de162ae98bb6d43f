use thiserror::Error;

/// Hard failures of the decode core. Everything else (ambiguous framing,
/// failed UTF-8 reinterpretation) falls back to a best-effort result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// Fewer than the required share of characters belong to the alphabet.
    #[error("Text does not appear to be Base64 encoded.")]
    NotBase64 { ratio: f64 },

    /// The alphabet check passed but the decode primitive rejected the input.
    #[error("Invalid Base64 string.")]
    InvalidBase64,
}
