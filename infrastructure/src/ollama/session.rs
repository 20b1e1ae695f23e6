//! Ollama session.
//!
//! Ollama's chat endpoint is stateless, so a session is just a model plus an
//! optional system prompt. Each `send` is an independent single-turn request.

use crate::ollama::gateway::OllamaClient;
use crate::ollama::protocol::Message;
use async_trait::async_trait;
use retail_application::{GatewayError, LlmSession};
use retail_domain::Model;
use std::sync::Arc;
use tracing::debug;

pub struct OllamaSession {
    client: Arc<OllamaClient>,
    model: Model,
    system_prompt: Option<String>,
}

impl OllamaSession {
    pub(crate) fn new(
        client: Arc<OllamaClient>,
        model: Model,
        system_prompt: Option<String>,
    ) -> Self {
        Self {
            client,
            model,
            system_prompt,
        }
    }

    fn messages(&self, content: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(content));
        messages
    }
}

#[async_trait]
impl LlmSession for OllamaSession {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        debug!("Sending {} bytes to {}", content.len(), self.model);
        Ok(self.client.chat(&self.model, self.messages(content)).await?)
    }
}
