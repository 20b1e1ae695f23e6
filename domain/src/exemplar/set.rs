//! Exemplar sets and their prompt rendering

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Pipeline stage an exemplar set is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Router,
    QueryGeneration,
    QueryRepair,
    Synthesis,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Router,
        Stage::QueryGeneration,
        Stage::QueryRepair,
        Stage::Synthesis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Router => "router",
            Stage::QueryGeneration => "query_generation",
            Stage::QueryRepair => "query_repair",
            Stage::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input/output pair. Field order is preserved for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    #[serde(default)]
    pub inputs: Map<String, Value>,
    #[serde(default)]
    pub output: Map<String, Value>,
}

impl Exemplar {
    pub fn new(inputs: Map<String, Value>, output: Map<String, Value>) -> Self {
        Self { inputs, output }
    }

    pub fn render(&self) -> String {
        self.inputs
            .iter()
            .chain(self.output.iter())
            .map(|(field, value)| format!("{}: {}", field_label(field), value_text(value)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `format_hint` -> `Format hint`
fn field_label(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Versioned exemplars for one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExemplarSet {
    pub stage: Stage,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub examples: Vec<Exemplar>,
}

impl ExemplarSet {
    pub fn new(stage: Stage, version: impl Into<String>, examples: Vec<Exemplar>) -> Self {
        Self {
            stage,
            version: version.into(),
            examples,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Numbered examples block, or an empty string when there are none
    pub fn render(&self) -> String {
        self.examples
            .iter()
            .enumerate()
            .map(|(i, e)| format!("Example {}:\n{}", i + 1, e.render()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// All exemplar sets, keyed by stage
#[derive(Debug, Clone, Default)]
pub struct ExemplarLibrary {
    sets: HashMap<Stage, ExemplarSet>,
}

impl ExemplarLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a set, replacing any previous set for the same stage
    pub fn insert(&mut self, set: ExemplarSet) {
        self.sets.insert(set.stage, set);
    }

    pub fn get(&self, stage: Stage) -> Option<&ExemplarSet> {
        self.sets.get(&stage)
    }

    /// Rendered examples for `stage` ("" when zero-shot)
    pub fn render(&self, stage: Stage) -> String {
        self.get(stage).map(ExemplarSet::render).unwrap_or_default()
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.get(stage).map_or(0, ExemplarSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.values().all(ExemplarSet::is_empty)
    }

    /// `router=3@v2 synthesis=0` style summary for startup logs
    pub fn summary(&self) -> String {
        Stage::ALL
            .iter()
            .map(|stage| match self.get(*stage) {
                Some(set) if !set.version.is_empty() => {
                    format!("{}={}@{}", stage, set.len(), set.version)
                }
                _ => format!("{}={}", stage, self.count(*stage)),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn router_set() -> ExemplarSet {
        serde_json::from_value(json!({
            "stage": "router",
            "version": "v2",
            "examples": [
                {
                    "inputs": {"question": "What is the return window for unopened Beverages?"},
                    "output": {"reasoning": "Policy text lives in the docs.", "route": "retrieval"}
                },
                {
                    "inputs": {"question": "Top 3 products by revenue"},
                    "output": {"route": "query"}
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_render_keeps_field_order() {
        let rendered = router_set().render();
        assert_eq!(
            rendered,
            "Example 1:\n\
Question: What is the return window for unopened Beverages?\n\
Reasoning: Policy text lives in the docs.\n\
Route: retrieval\n\
\n\
Example 2:\n\
Question: Top 3 products by revenue\n\
Route: query"
        );
    }

    #[test]
    fn test_field_label() {
        assert_eq!(field_label("format_hint"), "Format hint");
        assert_eq!(field_label(""), "");
    }

    #[test]
    fn test_non_string_values_render_as_json() {
        let e = Exemplar::new(
            Map::new(),
            json!({"answer": {"category": "Beverages"}})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(e.render(), r#"Answer: {"category":"Beverages"}"#);
    }

    #[test]
    fn test_library_zero_shot_default() {
        let mut lib = ExemplarLibrary::new();
        assert!(lib.is_empty());
        assert_eq!(lib.render(Stage::Synthesis), "");
        lib.insert(router_set());
        assert_eq!(lib.count(Stage::Router), 2);
        assert!(!lib.is_empty());
        assert_eq!(
            lib.summary(),
            "router=2@v2 query_generation=0 query_repair=0 synthesis=0"
        );
    }
}
