//! Answer synthesis domain
//!
//! Turning evidence into a typed [`FinalAnswer`]: parsing the synthesizer's
//! labelled response, coercing text or result rows to the shape a
//! [`FormatHint`](crate::FormatHint) asks for, and the deterministic
//! fallback used when the model's answer cannot be coerced.

mod answer;
mod coerce;

pub use answer::{
    Citation, FinalAnswer, MAX_EXPLANATION_CHARS, SynthesisOutput, parse_synthesis_response,
};
pub use coerce::{
    FormatMismatch, coerce_rows, coerce_text, default_value, extract_json, first_number,
};
