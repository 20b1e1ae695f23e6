//! Question value object

use super::error::DomainError;
use super::format_hint::FormatHint;
use serde::{Deserialize, Serialize};

/// A question to be answered by the pipeline (Value Object)
///
/// Immutable once constructed. The optional format hint describes the
/// expected shape of the final answer value; the optional id is carried
/// through to batch output unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(alias = "question")]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format_hint: Option<FormatHint>,
}

impl Question {
    /// Create a new question
    ///
    /// # Panics
    /// Panics if the content is empty or only whitespace
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        assert!(!content.trim().is_empty(), "Question cannot be empty");
        Self {
            id: None,
            content,
            format_hint: None,
        }
    }

    /// Try to create a new question, returning None if invalid
    pub fn try_new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            None
        } else {
            Some(Self {
                id: None,
                content,
                format_hint: None,
            })
        }
    }

    /// Validate and create a question, reporting why it was rejected
    pub fn parse(content: impl Into<String>) -> Result<Self, DomainError> {
        Self::try_new(content)
            .ok_or_else(|| DomainError::InvalidQuestion("question text is empty".to_string()))
    }

    pub fn with_format_hint(mut self, hint: FormatHint) -> Self {
        self.format_hint = Some(hint);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Get the question content
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn format_hint(&self) -> Option<&FormatHint> {
        self.format_hint.as_ref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Identifier used in logs and progress output
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("-")
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl From<&str> for Question {
    fn from(s: &str) -> Self {
        Question::new(s)
    }
}

impl From<String> for Question {
    fn from(s: String) -> Self {
        Question::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_creation() {
        let q = Question::new("What were total sales in June 1997?");
        assert_eq!(q.content(), "What were total sales in June 1997?");
        assert!(q.format_hint().is_none());
        assert_eq!(q.display_id(), "-");
    }

    #[test]
    fn test_question_builders() {
        let q = Question::new("Top 3 products by revenue")
            .with_id("q7")
            .with_format_hint(FormatHint::parse("list[{product:str, revenue:float}]"));
        assert_eq!(q.id(), Some("q7"));
        assert_eq!(q.format_hint().map(|h| h.kind()), Some("list"));
    }

    #[test]
    #[should_panic]
    fn test_empty_question_panics() {
        Question::new("");
    }

    #[test]
    fn test_try_new_empty() {
        assert!(Question::try_new("").is_none());
        assert!(Question::try_new("   ").is_none());
    }

    #[test]
    fn test_parse_reports_error() {
        let err = Question::parse("  ").unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_deserialize_batch_line() {
        let line = r#"{"id": "rag_policy", "question": "Return window?", "format_hint": "int"}"#;
        let q: Question = serde_json::from_str(line).unwrap();
        assert_eq!(q.id(), Some("rag_policy"));
        assert_eq!(q.format_hint(), Some(&FormatHint::Integer));
    }
}
