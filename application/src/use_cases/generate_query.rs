//! Generate Query use case
//!
//! Produces one SQL statement from the question, the reduced schema, and
//! (on the hybrid route) retrieved document text. The same model revises a
//! failed statement given the store's error.

use crate::ports::conversation_logger::{ConversationLogger, NoConversationLogger};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::use_cases::shared::{Completion, complete};
use retail_domain::{Model, PromptTemplate, clean_generated_sql};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Inputs shared by generation and repair for one question
#[derive(Debug, Clone, Copy)]
pub struct QueryRequest<'a> {
    pub question: &'a str,
    /// Schema rendered for prompting
    pub schema: &'a str,
    /// Retrieved document text, when the route retrieved anything
    pub context: Option<&'a str>,
    pub generation_exemplars: &'a str,
    pub repair_exemplars: &'a str,
}

pub struct GenerateQueryUseCase {
    gateway: Arc<dyn LlmGateway>,
    model: Model,
    timeout: Option<Duration>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl GenerateQueryUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>, model: Model) -> Self {
        Self {
            gateway,
            model,
            timeout: None,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Initial statement for the question. May be empty when the model
    /// returned nothing statement-like.
    pub async fn generate(&self, request: &QueryRequest<'_>) -> Result<String, GatewayError> {
        let prompt = PromptTemplate::query_prompt(
            request.question,
            request.schema,
            request.context,
            request.generation_exemplars,
        );
        let raw = self
            .call("generate_query", PromptTemplate::query_system(), &prompt)
            .await?;
        let sql = clean_generated_sql(&raw);
        debug!("Generated SQL: {}", sql);
        Ok(sql)
    }

    /// Revised statement for `failed_sql`, which failed with `error`
    pub async fn repair(
        &self,
        request: &QueryRequest<'_>,
        failed_sql: &str,
        error: &str,
    ) -> Result<String, GatewayError> {
        let prompt = PromptTemplate::repair_prompt(
            request.question,
            request.schema,
            failed_sql,
            error,
            request.repair_exemplars,
        );
        let raw = self
            .call("repair_query", PromptTemplate::repair_system(), &prompt)
            .await?;
        let sql = clean_generated_sql(&raw);
        debug!("Repaired SQL: {}", sql);
        Ok(sql)
    }

    async fn call(
        &self,
        stage: &'static str,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        complete(
            self.gateway.as_ref(),
            self.conversation_logger.as_ref(),
            Completion {
                stage,
                model: &self.model,
                system_prompt,
                prompt,
                timeout: self.timeout,
            },
        )
        .await
    }
}
