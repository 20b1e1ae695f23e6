//! Read-only resources shared by every question.

use retail_domain::{ExemplarLibrary, LexicalRetriever, SchemaDescription};

/// Everything built once at startup and only read afterwards: the indexed
/// corpus, the reduced schema, and the few-shot exemplars.
///
/// Shared between concurrent questions through `Arc`.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub retriever: LexicalRetriever,
    pub schema: SchemaDescription,
    pub exemplars: ExemplarLibrary,
}

impl PipelineContext {
    pub fn new(
        retriever: LexicalRetriever,
        schema: SchemaDescription,
        exemplars: ExemplarLibrary,
    ) -> Self {
        Self {
            retriever,
            schema,
            exemplars,
        }
    }
}
