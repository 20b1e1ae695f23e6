//! Domain layer for retail-copilot
//!
//! This crate contains the core answering logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns: no
//! network, no database, no filesystem.
//!
//! # Core Concepts
//!
//! ## Routing
//!
//! Every question is classified once into a [`RouteDecision`]:
//!
//! - **Retrieval**: answered from document chunks
//! - **Query**: answered from a generated structured query
//! - **Hybrid**: documents supply dates or definitions, the query supplies figures
//!
//! Classification fails closed to `Hybrid`, the superset route.
//!
//! ## Repair
//!
//! A failed query is regenerated from the store's error text, at most
//! [`MAX_REPAIRS`] times. The cap travels by value in a [`RepairBudget`].
//!
//! ## Confidence
//!
//! [`score_confidence`] turns a [`PipelineTrace`] into a score in `[0, 1]`.

pub mod config;
pub mod core;
pub mod exemplar;
pub mod pipeline;
pub mod prompt;
pub mod query;
pub mod retrieval;
pub mod routing;
pub mod scoring;
pub mod synthesis;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, ModelConfig, OutputFormat, Severity};
pub use core::{
    error::DomainError, format_hint::FormatHint, model::Model, question::Question,
};
pub use exemplar::{Exemplar, ExemplarLibrary, ExemplarSet, Stage};
pub use pipeline::{PipelineStage, PipelineTrace};
pub use prompt::PromptTemplate;
pub use query::{
    ColumnSchema, MAX_REPAIRS, QueryAttempt, QueryResult, RepairBudget, RepairEvent, RepairState,
    RepairStep, RepairTrace, Row, Scalar, SchemaDescription, TableSchema, clean_generated_sql,
    tables_referenced,
};
pub use retrieval::{
    Chunk, ChunkId, ChunkStore, LexicalRetriever, RetrievalResult, ScoredChunk,
    StructuralChunker,
};
pub use routing::{Classification, RouteDecision, parse_classification};
pub use scoring::{ConfidenceBreakdown, score_confidence};
pub use synthesis::{
    Citation, FinalAnswer, FormatMismatch, SynthesisOutput, parse_synthesis_response,
};
