mod core;
mod error;
mod frame;


pub use self::core::{
    MIN_ALPHABET_RATIO, alphabet_ratio, check_plausible, decode_base64, encode_base64,
    is_base64_char, is_valid_base64, normalize, strip_whitespace,
};
pub(crate) use self::core::decode_unchecked;
pub use self::error::DecodeError;
pub use self::frame::{DecodedText, Framing, frame};
