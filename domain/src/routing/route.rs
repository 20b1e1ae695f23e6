//! Route decision value object and classifier response parsing

use crate::core::string::single_line;
use serde::{Deserialize, Serialize};

/// Resolution strategy chosen for a question (Value Object)
///
/// Produced once per question and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteDecision {
    /// Answer from retrieved document chunks only
    Retrieval,
    /// Answer from a generated structured query only
    Query,
    /// Retrieve first, then query with the retrieved context
    Hybrid,
}

impl RouteDecision {
    pub const ALL: [RouteDecision; 3] = [
        RouteDecision::Retrieval,
        RouteDecision::Query,
        RouteDecision::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::Retrieval => "retrieval",
            RouteDecision::Query => "query",
            RouteDecision::Hybrid => "hybrid",
        }
    }

    /// Parse a classifier label.
    ///
    /// Accepts the canonical labels plus the short aliases models tend to
    /// produce (`rag`, `docs`, `sql`, `both`). Returns `None` for anything else.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "retrieval" | "rag" | "docs" | "documents" => Some(RouteDecision::Retrieval),
            "query" | "sql" | "database" => Some(RouteDecision::Query),
            "hybrid" | "both" => Some(RouteDecision::Hybrid),
            _ => None,
        }
    }

    /// Whether this route consults the document corpus
    pub fn needs_retrieval(&self) -> bool {
        matches!(self, RouteDecision::Retrieval | RouteDecision::Hybrid)
    }

    /// Whether this route generates and executes a structured query
    pub fn needs_query(&self) -> bool {
        matches!(self, RouteDecision::Query | RouteDecision::Hybrid)
    }
}

impl Default for RouteDecision {
    /// The superset path, used whenever classification fails
    fn default() -> Self {
        RouteDecision::Hybrid
    }
}

impl std::fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of classifying a question.
///
/// `rationale` is the model's reasoning text. It is informational only and
/// never drives control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub route: RouteDecision,
    pub rationale: String,
    /// True when the route is the fail-closed default rather than a parsed label
    pub fell_back: bool,
}

impl Classification {
    pub fn new(route: RouteDecision, rationale: impl Into<String>) -> Self {
        Self {
            route,
            rationale: rationale.into(),
            fell_back: false,
        }
    }

    /// Fail-closed classification: the hybrid superset route
    pub fn fail_closed(reason: impl Into<String>) -> Self {
        Self {
            route: RouteDecision::default(),
            rationale: reason.into(),
            fell_back: true,
        }
    }
}

/// Parse a router response of the form
///
/// ```text
/// Reasoning: the question asks for a policy defined in the docs
/// Route: retrieval
/// ```
///
/// The last `Route:` line wins. If there is none, a response whose final
/// non-empty line is a bare label is accepted. Keywords inside the reasoning
/// are never scanned, so "this is not a sql question" cannot leak a label.
///
/// # Examples
///
/// ```
/// use retail_domain::{parse_classification, RouteDecision};
///
/// let c = parse_classification("Reasoning: needs a sum over orders\nRoute: sql");
/// assert_eq!(c.route, RouteDecision::Query);
///
/// let c = parse_classification("I am not sure.");
/// assert_eq!(c.route, RouteDecision::Hybrid);
/// assert!(c.fell_back);
/// ```
pub fn parse_classification(response: &str) -> Classification {
    let lines: Vec<&str> = response.lines().collect();

    let route_line = lines.iter().enumerate().rev().find_map(|(idx, line)| {
        let cleaned = strip_decoration(line);
        let (key, value) = cleaned.split_once(':')?;
        if key.trim().eq_ignore_ascii_case("route") {
            Some((idx, value))
        } else {
            None
        }
    });

    if let Some((idx, value)) = route_line {
        let rationale = rationale_from(&lines[..idx]);
        return match first_word(value).and_then(RouteDecision::from_label) {
            Some(route) => Classification::new(route, rationale),
            None => Classification::fail_closed(format!(
                "unrecognized route label '{}'",
                value.trim()
            )),
        };
    }

    // Bare label on the last non-empty line
    if let Some((idx, line)) = lines
        .iter()
        .enumerate()
        .rev()
        .find(|(_, line)| !line.trim().is_empty())
    {
        let cleaned = strip_decoration(line);
        if cleaned.split_whitespace().count() == 1
            && let Some(route) = first_word(cleaned).and_then(RouteDecision::from_label)
        {
            return Classification::new(route, rationale_from(&lines[..idx]));
        }
    }

    Classification::fail_closed("no route label in classifier response")
}

fn strip_decoration(line: &str) -> &str {
    line.trim()
        .trim_start_matches(['*', '#', '-', '>', '`'])
        .trim()
}

fn first_word(value: &str) -> Option<&str> {
    value
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .find(|w| !w.is_empty())
}

fn rationale_from(lines: &[&str]) -> String {
    let text = lines.join(" ");
    let text = single_line(&text);
    let lower = text.to_lowercase();
    for prefix in ["reasoning:", "**reasoning:**", "reasoning :"] {
        if lower.starts_with(prefix)
            && let Some(rest) = text.get(prefix.len()..)
        {
            return rest.trim().to_string();
        }
    }
    text
}
