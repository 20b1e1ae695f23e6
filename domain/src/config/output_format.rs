//! Output format value object

use serde::{Deserialize, Serialize};

/// Output format for final answers
///
/// This is a domain concept representing how the output should be formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Answer with route, confidence, citations and SQL
    Full,
    /// Only the answer value (default)
    Answer,
    /// JSON output
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Answer
    }
}
