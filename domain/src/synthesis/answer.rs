//! Final answer entity and synthesizer response parsing

use crate::core::string::{single_line, truncate};
use crate::retrieval::ChunkId;
use crate::routing::RouteDecision;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Maximum length of the one-sentence explanation
pub const MAX_EXPLANATION_CHARS: usize = 200;

/// Evidence an answer rests on.
///
/// Serialized as a plain string: the chunk id, `query`, or the table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Citation {
    Chunk(ChunkId),
    /// The executed structured query
    Query,
    /// A table the successful query read from
    Table(String),
}

impl Citation {
    pub const QUERY_MARKER: &'static str = "query";

    pub fn as_str(&self) -> &str {
        match self {
            Citation::Chunk(id) => id.as_str(),
            Citation::Query => Self::QUERY_MARKER,
            Citation::Table(name) => name,
        }
    }
}

impl std::fmt::Display for Citation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Citation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The pipeline's answer to one question (Entity)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalAnswer {
    /// Typed value shaped by the question's format hint
    pub value: Value,
    pub citations: Vec<Citation>,
    /// Always within `[0, 1]`
    pub confidence: f64,
    pub explanation: String,
    /// Last query text, when the query path ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    pub route: RouteDecision,
    /// Neither retrieval nor the query produced usable evidence
    pub insufficient_evidence: bool,
    /// The value is a best-effort fallback after the model's answer could not
    /// be shaped. `confidence` is not lowered for it.
    pub format_mismatch: bool,
}

impl FinalAnswer {
    pub fn citation_strings(&self) -> Vec<String> {
        self.citations.iter().map(|c| c.as_str().to_string()).collect()
    }

    /// The value rendered for display: strings unquoted, everything else as JSON
    pub fn value_display(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Labelled fields of a synthesizer completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOutput {
    pub answer: String,
    pub explanation: String,
}

/// Split a completion of the form
///
/// ```text
/// Answer: {"category": "Beverages", "quantity": 123}
/// Explanation: Highest quantity sold during the campaign.
/// ```
///
/// The answer may span several lines. A completion without an `Answer:` label
/// is taken to be the answer in full. The explanation is collapsed to one line
/// and capped at [`MAX_EXPLANATION_CHARS`].
pub fn parse_synthesis_response(text: &str) -> SynthesisOutput {
    let mut answer_lines: Vec<&str> = Vec::new();
    let mut explanation_lines: Vec<&str> = Vec::new();
    let mut in_explanation = false;
    let mut saw_answer_label = false;

    for line in text.lines() {
        if let Some(rest) = labelled(line, "explanation") {
            in_explanation = true;
            explanation_lines.push(rest);
        } else if let Some(rest) = labelled(line, "answer") {
            saw_answer_label = true;
            in_explanation = false;
            answer_lines.clear();
            answer_lines.push(rest);
        } else if in_explanation {
            explanation_lines.push(line);
        } else if saw_answer_label || !line.trim().is_empty() || !answer_lines.is_empty() {
            answer_lines.push(line);
        }
    }

    let explanation = single_line(&explanation_lines.join(" "));
    SynthesisOutput {
        answer: answer_lines.join("\n").trim().to_string(),
        explanation: truncate(&explanation, MAX_EXPLANATION_CHARS),
    }
}

/// Text after `<label>:` when `line` starts with that label (case-insensitive,
/// markdown emphasis allowed)
fn labelled<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let stripped = line.trim().trim_start_matches(['*', '#', '-', ' ']);
    let head = stripped.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = stripped.get(label.len()..)?.trim_start_matches('*').trim_start();
    rest.strip_prefix(':')
        .map(|r| r.trim_start_matches('*').trim())
}
