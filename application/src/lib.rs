//! Application layer for retail-copilot
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod context;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::PipelineParams;
pub use context::PipelineContext;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, LlmGateway, LlmSession},
    progress::{NoProgress, ProgressNotifier},
    query_store::{QueryStorePort, StoreError},
};
pub use use_cases::answer_batch::{AnswerBatchUseCase, BatchRecord};
pub use use_cases::answer_question::{AnswerOutcome, AnswerQuestionError, AnswerQuestionUseCase};
pub use use_cases::classify_route::ClassifyRouteUseCase;
pub use use_cases::generate_query::{GenerateQueryUseCase, QueryRequest};
pub use use_cases::repair_loop::{RepairLoopUseCase, RepairOutcome};
pub use use_cases::synthesize_answer::{SynthesizeAnswerUseCase, SynthesizedAnswer};
