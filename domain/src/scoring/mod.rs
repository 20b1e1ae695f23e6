//! Confidence scoring

mod confidence;

pub use confidence::{ConfidenceBreakdown, score_confidence};
