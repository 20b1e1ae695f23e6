//! Role-based model configuration.
//!
//! [`ModelConfig`] groups the model selections for the LLM-backed stages.
//! This is a static value object: once created, models don't change at runtime.

use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Role-based model configuration.
///
/// - **Router**: small instruction model for route classification
/// - **Query**: code-oriented model for query generation and repair
/// - **Synthesizer**: model that merges evidence into the final answer
///
/// # Example
///
/// ```
/// use retail_domain::{Model, ModelConfig};
///
/// let config = ModelConfig::default().with_query(Model::Qwen25Coder14b);
/// assert_eq!(config.query, Model::Qwen25Coder14b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model for route classification.
    pub router: Model,
    /// Model for query generation and repair.
    pub query: Model,
    /// Model for answer synthesis.
    pub synthesizer: Model,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            router: Model::default_router(),
            query: Model::default_query(),
            synthesizer: Model::default_router(),
        }
    }
}

impl ModelConfig {
    // ==================== Builder Methods ====================

    pub fn with_router(mut self, model: Model) -> Self {
        self.router = model;
        self
    }

    pub fn with_query(mut self, model: Model) -> Self {
        self.query = model;
        self
    }

    pub fn with_synthesizer(mut self, model: Model) -> Self {
        self.synthesizer = model;
        self
    }

    /// Every distinct model used by the pipeline, in role order
    pub fn distinct_models(&self) -> Vec<&Model> {
        let mut models: Vec<&Model> = Vec::with_capacity(3);
        for model in [&self.router, &self.query, &self.synthesizer] {
            if !models.contains(&model) {
                models.push(model);
            }
        }
        models
    }
}
