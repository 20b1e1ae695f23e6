//! Infrastructure layer for retail-copilot
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration and data loading.

pub mod batch;
pub mod config;
pub mod corpus;
pub mod exemplars;
pub mod logging;
pub mod ollama;
pub mod sqlite;

// Re-export commonly used types
pub use batch::{BatchIoError, read_questions, write_records};
pub use config::{
    ConfigLoader, FileConfig, FileDatabaseConfig, FileInferenceConfig, FileLoggingConfig,
    FileModelsConfig, FileOutputConfig, FileOutputFormat, FilePipelineConfig,
};
pub use corpus::{CorpusError, CorpusLoader};
pub use exemplars::{ExemplarError, ExemplarLoader};
pub use logging::JsonlConversationLogger;
pub use ollama::{
    error::OllamaError, gateway::OllamaLlmGateway, protocol::ChatOptions, session::OllamaSession,
};
pub use sqlite::{SchemaFilter, SqliteQueryStore, SqliteStoreOptions, StorageError};
