//! Lexical retrieval domain.
//!
//! Documents are split into topically coherent [`Chunk`]s at structural
//! boundaries ([`StructuralChunker`]), collected into a read-only
//! [`ChunkStore`], and ranked against a query with BM25 by
//! [`LexicalRetriever`].
//!
//! Retrieval is keyword based by design: there are no embeddings and no
//! semantic expansion. A query that shares no content term with the corpus
//! yields an empty [`RetrievalResult`], which is a valid "no evidence"
//! outcome rather than an error.

mod bm25;
mod chunk;
mod chunker;
mod tokenize;

pub use bm25::{Bm25Params, LexicalRetriever, MAX_RETRIEVED, RetrievalResult, ScoredChunk};
pub use chunk::{Chunk, ChunkId, ChunkStore, TermStats};
pub use chunker::{ChunkingStrategy, DEFAULT_MAX_CHUNK_CHARS, StructuralChunker};
pub use tokenize::tokenize;
