//! Chunk entities and the read-only chunk store

use super::tokenize::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Stable chunk identifier of the form `<source>::chunk<N>` (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    pub fn new(source: &str, index: usize) -> Self {
        Self(format!("{source}::chunk{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-chunk term statistics computed once at indexing time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermStats {
    pub term_freq: HashMap<String, u32>,
    pub length: usize,
}

impl TermStats {
    pub fn from_text(text: &str) -> Self {
        let tokens = tokenize(text);
        let mut term_freq = HashMap::new();
        for token in &tokens {
            *term_freq.entry(token.clone()).or_insert(0) += 1;
        }
        Self {
            term_freq,
            length: tokens.len(),
        }
    }

    pub fn frequency(&self, term: &str) -> u32 {
        self.term_freq.get(term).copied().unwrap_or(0)
    }
}

/// A contiguous passage of a source document (Entity)
///
/// Immutable once indexed. Shared between the store and retrieval results
/// through `Arc`, so results never copy chunk text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: ChunkId,
    pub source: String,
    pub content: String,
    /// Byte offset of the chunk body in the source document
    pub offset: usize,
    pub stats: TermStats,
}

impl Chunk {
    pub fn new(source: &str, index: usize, content: impl Into<String>, offset: usize) -> Self {
        let content = content.into();
        let stats = TermStats::from_text(&content);
        Self {
            id: ChunkId::new(source, index),
            source: source.to_string(),
            content,
            offset,
            stats,
        }
    }
}

/// Read-only collection of indexed chunks
#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    chunks: Vec<Arc<Chunk>>,
}

impl ChunkStore {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks: chunks.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn chunks(&self) -> &[Arc<Chunk>] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Distinct source documents, in index order
    pub fn sources(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for chunk in &self.chunks {
            if !seen.contains(&chunk.source.as_str()) {
                seen.push(&chunk.source);
            }
        }
        seen
    }
}
