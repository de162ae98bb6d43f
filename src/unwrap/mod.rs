mod core;
mod highlight;
mod report;


pub use self::core::{
    DecodeConfig, DecodeOutcome, MAX_MESSAGE_LENGTH, MAX_PROCESSING_LENGTH, MAX_UNWRAPS,
    Unwrapped, decode_selection, unwrap,
};
pub use self::highlight::{HighlightMarker, Highlighted, highlight};
pub use self::report::{render_error, render_report};
