use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::base64::is_valid_base64;

/// Runs of at least 20 alphabet characters with up to two padding characters.
static BASE64_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9+/]{20,}={0,2}").expect("static pattern compiles"));

/// Delimiters placed around embedded Base64 so the page can offer to decode it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightMarker {
    pub open: String,
    pub close: String,
}

impl Default for HighlightMarker {
    fn default() -> Self {
        Self {
            open: "🔍 [decodable]".to_string(),
            close: "[decodable] 🔍".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
    pub text: String,
    /// Number of runs that passed the round-trip check and were wrapped.
    pub matches: usize,
}

/// Wrap every embedded run that round-trips as Base64 with `marker`.
/// Runs that fail the check are left as they are.
pub fn highlight(text: &str, marker: &HighlightMarker) -> Highlighted {
    let mut matches = 0usize;
    let text = BASE64_RUN
        .replace_all(text, |caps: &Captures| {
            let run = &caps[0];
            if is_valid_base64(run) {
                matches += 1;
                format!("{} {} {}", marker.open, run, marker.close)
            } else {
                run.to_string()
            }
        })
        .into_owned();
    Highlighted { text, matches }
}
