//! Wire types for the Ollama HTTP API.
//!
//! Only the two endpoints the pipeline needs:
//!
//! - `POST /api/chat` with `stream: false`: one prompt, one complete reply
//! - `GET /api/tags`: installed models, used as the startup health check

use serde::{Deserialize, Serialize};

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling options sent with every request.
///
/// A fixed seed and zero temperature keep answers reproducible across runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub temperature: f32,
    /// Maximum tokens to generate
    pub num_predict: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            seed: Some(42),
            temperature: 0.0,
            num_predict: 1500,
        }
    }
}

/// `POST /api/chat` body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message>,
    pub stream: bool,
    pub options: &'a ChatOptions,
}

/// `POST /api/chat` reply (non-streaming)
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `GET /api/tags` reply
#[derive(Debug, Clone, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
}
