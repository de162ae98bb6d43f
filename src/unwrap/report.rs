use std::fmt::Write as _;

use super::core::{DecodeConfig, DecodeOutcome};
use super::highlight::highlight;

const TRUNCATED_SUFFIX: &str = "\n\n... (Result truncated due to size limit)";

/// Room kept free for the size-limit suffix.
const SUFFIX_RESERVE: usize = 100;

/// First `max` characters of `text`, with `...` appended when cut.
fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Render the user-facing message for a decode outcome.
///
/// Layout: an optional truncation warning, the (highlighted) final text,
/// the numbered decode trace when more than one layer was decoded, and a
/// hint when embedded Base64 was marked. The whole message is capped at
/// `config.max_message_len` characters.
pub fn render_report(outcome: &DecodeOutcome, config: &DecodeConfig) -> String {
    let mut msg = String::new();

    if outcome.truncated {
        let _ = write!(
            msg,
            "⚠️ Text too long ({} characters); only the first {} characters were decoded.\n\n",
            outcome.original_length, outcome.processed_length
        );
    }

    let (body, marked) = if config.highlight {
        let h = highlight(&outcome.final_text, &config.marker);
        (h.text, h.matches > 0)
    } else {
        (outcome.final_text.clone(), false)
    };
    let _ = write!(msg, "🔓 Base64 decode result:\n\n{body}");

    if outcome.has_trace() {
        msg.push_str("\n\n📋 Decode steps:");
        let chain = outcome
            .steps
            .iter()
            .chain(std::iter::once(&outcome.final_text));
        for (i, step) in chain.enumerate() {
            let _ = write!(msg, "\n{}. {}", i + 1, preview(step, config.step_preview_len));
        }
    }

    if marked {
        let _ = write!(
            msg,
            "\n\n💡 Hint: possible Base64 strings were found (marked {} ... {}); select one to decode it further.",
            config.marker.open, config.marker.close
        );
    }

    cap_message(msg, config.max_message_len)
}

/// Render a hard decode failure the way the page shows errors.
pub fn render_error(err: &dyn std::error::Error) -> String {
    format!("Error: {err}")
}

fn cap_message(msg: String, max: usize) -> String {
    if msg.chars().count() <= max {
        return msg;
    }
    let keep = max.saturating_sub(SUFFIX_RESERVE);
    let end = msg
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(msg.len());
    let mut out = String::with_capacity(end + TRUNCATED_SUFFIX.len());
    out.push_str(&msg[..end]);
    out.push_str(TRUNCATED_SUFFIX);
    out
}
