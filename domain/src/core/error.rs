//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Repair budget of {requested} exceeds the hard cap of {cap}")]
    RepairBudgetTooLarge { requested: u8, cap: u8 },

    #[error("Orchestration error: {0}")]
    OrchestrationError(String),
}

impl DomainError {
    /// Check if this error was caused by caller input rather than configuration
    pub fn is_input_error(&self) -> bool {
        matches!(self, DomainError::InvalidQuestion(_))
    }
}
