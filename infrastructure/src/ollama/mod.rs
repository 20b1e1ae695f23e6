//! Ollama adapter
//!
//! Implements LlmGateway over a local Ollama server's HTTP API.

pub mod error;
pub mod gateway;
pub mod protocol;
pub mod session;
