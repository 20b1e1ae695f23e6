//! Logging infrastructure: structured conversation transcripts.
//!
//! Diagnostic logging goes through `tracing`; this module only holds the
//! machine-readable transcript writer.

mod jsonl_logger;

pub use jsonl_logger::JsonlConversationLogger;
