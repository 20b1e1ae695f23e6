//! Coercion of free-form values to a format hint

use crate::core::format_hint::FormatHint;
use crate::query::{Row, Scalar};
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

static NUMBER_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"-?\d+(?:\.\d+)?").expect("number regex is valid")
});

/// A value could not be shaped to the requested hint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, got {found:?}")]
pub struct FormatMismatch {
    pub expected: &'static str,
    pub found: String,
}

impl FormatMismatch {
    fn new(hint: &FormatHint, found: impl Into<String>) -> Self {
        Self {
            expected: hint.kind(),
            found: crate::core::string::truncate(&found.into(), 80),
        }
    }
}

/// First decimal number appearing in `text`, ignoring thousands separators
pub fn first_number(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    NUMBER_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn number_value(n: f64, hint: &FormatHint) -> Value {
    match hint {
        FormatHint::Integer => Value::from(n.round() as i64),
        _ => Value::from(round2(n)),
    }
}

/// Parse JSON out of model text: the whole text, a fenced block, or the
/// outermost `{...}` / `[...]` span.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }
    [('{', '}'), ('[', ']')].iter().find_map(|(open, close)| {
        let start = trimmed.find(*open)?;
        let end = trimmed.rfind(*close)?;
        if end <= start {
            return None;
        }
        serde_json::from_str(&trimmed[start..=end]).ok()
    })
}

/// Shape model text to `hint`.
///
/// Numbers may arrive bare, quoted, or embedded in a sentence. Mappings and
/// lists must contain parseable JSON; a lone object is accepted as a
/// one-element list and a one-element list as a mapping.
pub fn coerce_text(text: &str, hint: &FormatHint) -> Result<Value, FormatMismatch> {
    let text = text.trim();
    match hint {
        FormatHint::Integer | FormatHint::Float => {
            let parsed = match serde_json::from_str::<Value>(text) {
                Ok(Value::Number(n)) => n.as_f64(),
                Ok(Value::String(s)) => first_number(&s),
                _ => first_number(text),
            };
            parsed
                .map(|n| number_value(n, hint))
                .ok_or_else(|| FormatMismatch::new(hint, text))
        }
        FormatHint::Text => Ok(match serde_json::from_str::<Value>(text) {
            Ok(Value::String(s)) => Value::String(s),
            _ => Value::String(text.to_string()),
        }),
        FormatHint::Mapping { .. } => match extract_json(text) {
            Some(Value::Object(map)) => Ok(Value::Object(map)),
            Some(Value::Array(mut items)) if items.len() == 1 && items[0].is_object() => {
                Ok(items.remove(0))
            }
            _ => Err(FormatMismatch::new(hint, text)),
        },
        FormatHint::List { .. } => match extract_json(text) {
            Some(Value::Array(items)) => Ok(Value::Array(items)),
            Some(Value::Object(map)) => Ok(Value::Array(vec![Value::Object(map)])),
            _ => Err(FormatMismatch::new(hint, text)),
        },
    }
}

/// Shape query rows to `hint` without a model.
///
/// Scalars come from the first column of the first row, a mapping from the
/// first row, and a list from every row (bare values when each row has a
/// single column and the hint does not describe objects).
pub fn coerce_rows(rows: &[Row], hint: &FormatHint) -> Result<Value, FormatMismatch> {
    let first = rows.first().and_then(Row::first);
    match hint {
        FormatHint::Integer | FormatHint::Float => first
            .and_then(Scalar::as_f64)
            .map(|n| number_value(n, hint))
            .ok_or_else(|| FormatMismatch::new(hint, describe(first))),
        FormatHint::Text => match first {
            Some(Scalar::Text(t)) => Ok(Value::String(t.clone())),
            Some(Scalar::Null) | None => Err(FormatMismatch::new(hint, describe(first))),
            Some(other) => Ok(Value::String(other.to_json().to_string())),
        },
        FormatHint::Mapping { .. } => rows
            .first()
            .map(Row::to_json)
            .ok_or_else(|| FormatMismatch::new(hint, "no rows")),
        FormatHint::List { shape } => {
            let scalar_items = !shape.contains('{') && rows.iter().all(|r| r.len() == 1);
            Ok(Value::Array(
                rows.iter()
                    .map(|r| match (scalar_items, r.first()) {
                        (true, Some(v)) => v.to_json(),
                        _ => r.to_json(),
                    })
                    .collect(),
            ))
        }
    }
}

fn describe(value: Option<&Scalar>) -> String {
    value.map_or_else(|| "no rows".to_string(), |v| v.to_json().to_string())
}

/// Typed empty value for `hint`
pub fn default_value(hint: &FormatHint) -> Value {
    match hint {
        FormatHint::Integer => Value::from(0),
        FormatHint::Float => Value::from(0.0),
        FormatHint::Text => Value::String(String::new()),
        FormatHint::Mapping { .. } => Value::Object(Default::default()),
        FormatHint::List { .. } => Value::Array(Vec::new()),
    }
}
