use serde::Serialize;
use tracing::{debug, trace, warn};

use super::highlight::HighlightMarker;
use crate::base64::{
    DecodeError, MIN_ALPHABET_RATIO, check_plausible, decode_unchecked, frame, is_valid_base64,
    normalize, strip_whitespace,
};

/// Longest selection processed; longer input is cut to this many characters.
pub const MAX_PROCESSING_LENGTH: usize = 20000;

/// Layers unwrapped after the first decode.
pub const MAX_UNWRAPS: usize = 5;

/// Largest result message handed to the page.
pub const MAX_MESSAGE_LENGTH: usize = 50000;

/// Process-wide decode settings. Passed explicitly to every operation.
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    /// Characters of trimmed input processed before truncation kicks in.
    pub max_length: usize,
    /// Extra layers unwrapped after the first decode.
    pub max_unwraps: usize,
    /// Intermediate text at or above this length is not unwrapped further.
    pub unwrap_length_cap: usize,
    pub min_alphabet_ratio: f64,
    /// Mark embedded Base64 runs in the rendered report.
    pub highlight: bool,
    pub marker: HighlightMarker,
    pub max_message_len: usize,
    /// Characters of each decode step shown in the report.
    pub step_preview_len: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_length: MAX_PROCESSING_LENGTH,
            max_unwraps: MAX_UNWRAPS,
            unwrap_length_cap: MAX_PROCESSING_LENGTH,
            min_alphabet_ratio: MIN_ALPHABET_RATIO,
            highlight: true,
            marker: HighlightMarker::default(),
            max_message_len: MAX_MESSAGE_LENGTH,
            step_preview_len: 100,
        }
    }
}

/// Result of [`unwrap`]: the innermost text plus every encoded layer that
/// was peeled off, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unwrapped {
    pub final_text: String,
    pub steps: Vec<String>,
}

/// Result record of a full selection decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeOutcome {
    pub final_text: String,
    /// Encoded text of each decoded layer, outermost first.
    pub steps: Vec<String>,
    pub truncated: bool,
    /// Length in characters of the trimmed input before truncation.
    pub original_length: usize,
    pub processed_length: usize,
}

impl DecodeOutcome {
    /// The step trace is only worth showing when more than one layer was decoded.
    #[inline]
    pub fn has_trace(&self) -> bool {
        self.steps.len() > 1
    }
}

/// Decode one layer: raw decode plus text framing.
fn decode_layer(candidate: &str) -> Result<String, DecodeError> {
    let bytes = decode_unchecked(candidate)?;
    let decoded = frame(&bytes);
    trace!(
        framing = ?decoded.framing,
        bytes = bytes.len(),
        chars = decoded.text.len(),
        "decoded layer"
    );
    Ok(decoded.text)
}

/// Keep decoding while the text still round-trips as Base64, staying under
/// the length cap and the iteration budget. Each consumed layer is appended
/// to `steps`.
fn unwrap_into(mut current: String, steps: &mut Vec<String>, config: &DecodeConfig) -> String {
    let mut remaining = config.max_unwraps;
    while remaining > 0 && current.len() < config.unwrap_length_cap && is_valid_base64(&current)
    {
        let next = match decode_layer(&current) {
            Ok(next) => next,
            Err(e) => {
                debug!(error = %e, "nested decode failed");
                break;
            }
        };
        if next == current {
            break;
        }
        debug!(layer = steps.len() + 1, "unwrapped nested base64");
        steps.push(std::mem::replace(&mut current, next));
        remaining -= 1;
    }
    current
}

/// Repeatedly decode `initial` while it is still valid Base64.
///
/// Terminates after at most `config.max_unwraps` layers, on a fixed point,
/// or once the text fails the round-trip check or reaches the length cap.
pub fn unwrap(initial: &str, config: &DecodeConfig) -> Unwrapped {
    let mut steps = Vec::new();
    let final_text = unwrap_into(initial.to_string(), &mut steps, config);
    Unwrapped { final_text, steps }
}

/// Cut `text` to its first `max` characters.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Decode a user selection end to end.
///
/// The selection is trimmed and cut to `config.max_length` characters (the
/// cut is reported, not hidden), checked for plausibility, normalized and
/// decoded once. Nested layers are then unwrapped with [`unwrap`] semantics.
/// Only [`DecodeError::NotBase64`] and [`DecodeError::InvalidBase64`] are
/// ever returned.
pub fn decode_selection(input: &str, config: &DecodeConfig) -> Result<DecodeOutcome, DecodeError> {
    let trimmed = input.trim();
    let original_length = trimmed.chars().count();

    let truncated = original_length > config.max_length;
    let (text, processed_length) = if truncated {
        warn!(
            original_length,
            max_length = config.max_length,
            "selection too long, truncating"
        );
        (truncate_chars(trimmed, config.max_length), config.max_length)
    } else {
        (trimmed, original_length)
    };

    check_plausible(text, config.min_alphabet_ratio)?;

    let cleaned = strip_whitespace(text).into_owned();
    let candidate = normalize(&cleaned);
    if candidate.len() != cleaned.len() {
        debug!(
            cleaned = cleaned.len(),
            normalized = candidate.len(),
            "repaired selection before decoding"
        );
    }

    let first = decode_layer(&candidate)?;
    let mut steps = vec![cleaned];
    let final_text = unwrap_into(first, &mut steps, config);
    debug!(steps = steps.len(), "decode finished");

    Ok(DecodeOutcome {
        final_text,
        steps,
        truncated,
        original_length,
        processed_length,
    })
}
