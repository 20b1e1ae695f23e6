//! Format hint value object
//!
//! A format hint is the caller's description of the expected answer shape.
//! Hints arrive as free text (`int`, `float`, `{category:str, quantity:int}`,
//! `list[{product:str, revenue:float}]`) and are parsed leniently: anything
//! unrecognised is treated as plain text.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Expected shape of a final answer value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatHint {
    /// A whole number
    Integer,
    /// A real number (rounded to two decimals)
    Float,
    /// Free text
    Text,
    /// A single mapping from field name to value; `shape` keeps the caller's description
    Mapping { shape: String },
    /// An ordered list; `shape` keeps the caller's description of one element
    List { shape: String },
}

impl FormatHint {
    /// Parse a hint string. Never fails: unknown hints become [`FormatHint::Text`].
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_lowercase();
        match lower.as_str() {
            "int" | "integer" => FormatHint::Integer,
            "float" | "number" | "double" | "decimal" => FormatHint::Float,
            "str" | "string" | "text" | "" => FormatHint::Text,
            _ if lower.starts_with("list[") || lower.starts_with('[') => FormatHint::List {
                shape: trimmed.to_string(),
            },
            _ if lower.starts_with('{') || lower.starts_with("dict") => FormatHint::Mapping {
                shape: trimmed.to_string(),
            },
            _ => FormatHint::Text,
        }
    }

    /// The hint as shown to the synthesizer model
    pub fn as_prompt_str(&self) -> &str {
        match self {
            FormatHint::Integer => "int",
            FormatHint::Float => "float",
            FormatHint::Text => "str",
            FormatHint::Mapping { shape } | FormatHint::List { shape } => shape,
        }
    }

    /// Short kind name used in logs and mismatch messages
    pub fn kind(&self) -> &'static str {
        match self {
            FormatHint::Integer => "integer",
            FormatHint::Float => "float",
            FormatHint::Text => "text",
            FormatHint::Mapping { .. } => "mapping",
            FormatHint::List { .. } => "list",
        }
    }

    /// Whether the hint asks for a single scalar value
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FormatHint::Integer | FormatHint::Float | FormatHint::Text
        )
    }
}

impl Default for FormatHint {
    fn default() -> Self {
        FormatHint::Text
    }
}

impl std::fmt::Display for FormatHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_prompt_str())
    }
}

impl Serialize for FormatHint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_prompt_str())
    }
}

impl<'de> Deserialize<'de> for FormatHint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(FormatHint::parse(&s))
    }
}
