//! Model value object representing an inference backend model

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Inference backend models (Value Object)
///
/// The pipeline addresses at least two distinct model configurations: a
/// small instruction model for routing/classification and a code-oriented
/// model for query generation and repair. The orchestration core never
/// depends on which concrete model fills a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    // Small instruction models (routing, synthesis)
    Phi35Mini,
    Llama32,
    Llama31,
    // Code-oriented models (query generation, repair)
    Qwen25Coder7b,
    Qwen25Coder14b,
    DeepseekCoderV2,
    // Custom
    Custom(String),
}

impl Model {
    /// Get the backend tag for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Phi35Mini => "phi3.5:3.8b-mini-instruct-q4_K_M",
            Model::Llama32 => "llama3.2:3b",
            Model::Llama31 => "llama3.1:8b",
            Model::Qwen25Coder7b => "qwen2.5-coder:7b",
            Model::Qwen25Coder14b => "qwen2.5-coder:14b",
            Model::DeepseekCoderV2 => "deepseek-coder-v2:16b",
            Model::Custom(s) => s,
        }
    }

    /// Default model for route classification
    pub fn default_router() -> Model {
        Model::Phi35Mini
    }

    /// Default model for query generation and repair
    pub fn default_query() -> Model {
        Model::Qwen25Coder7b
    }

    /// Check if this is a code-oriented model
    pub fn is_code_model(&self) -> bool {
        match self {
            Model::Qwen25Coder7b | Model::Qwen25Coder14b | Model::DeepseekCoderV2 => true,
            Model::Custom(s) => s.contains("coder") || s.contains("code"),
            _ => false,
        }
    }
}

impl Default for Model {
    /// Returns the default model (the router model)
    fn default() -> Self {
        Model::default_router()
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        match s {
            "phi3.5:3.8b-mini-instruct-q4_K_M" => Model::Phi35Mini,
            "llama3.2:3b" => Model::Llama32,
            "llama3.1:8b" => Model::Llama31,
            "qwen2.5-coder:7b" => Model::Qwen25Coder7b,
            "qwen2.5-coder:14b" => Model::Qwen25Coder14b,
            "deepseek-coder-v2:16b" => Model::DeepseekCoderV2,
            other => Model::Custom(other.to_string()),
        }
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Model::from(s))
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Model::from(s.as_str()))
    }
}
