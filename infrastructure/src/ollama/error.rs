//! Error types for the Ollama adapter

use retail_application::GatewayError;
use thiserror::Error;

/// Result type alias for Ollama operations
pub type Result<T> = std::result::Result<T, OllamaError>;

/// Errors that can occur when talking to an Ollama server
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Response carried no message content")]
    EmptyResponse,
}

impl From<OllamaError> for GatewayError {
    fn from(e: OllamaError) -> Self {
        match e {
            OllamaError::Client(inner) if inner.is_timeout() => GatewayError::Timeout,
            OllamaError::Client(inner) if inner.is_connect() => {
                GatewayError::ConnectionError(inner.to_string())
            }
            OllamaError::ModelNotFound(model) => GatewayError::ModelNotAvailable(model),
            other => GatewayError::RequestFailed(other.to_string()),
        }
    }
}
