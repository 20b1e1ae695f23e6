//! BM25 lexical ranking over a [`ChunkStore`]

use super::chunk::{Chunk, ChunkId, ChunkStore};
use super::tokenize::tokenize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Upper bound on chunks returned for a single query
pub const MAX_RETRIEVED: usize = 3;

/// BM25 free parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation
    pub k1: f64,
    /// Length normalization
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// A chunk paired with its relevance score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Arc<Chunk>,
    pub score: f64,
}

/// Ranked retrieval output, ordered by descending score.
///
/// Holds at most [`MAX_RETRIEVED`] entries, each with a positive score.
/// An empty result means the corpus has no lexical evidence for the query.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub chunks: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Mean score of the returned chunks (0.0 when empty)
    pub fn average_score(&self) -> f64 {
        if self.chunks.is_empty() {
            return 0.0;
        }
        self.chunks.iter().map(|c| c.score).sum::<f64>() / self.chunks.len() as f64
    }

    pub fn chunk_ids(&self) -> Vec<ChunkId> {
        self.chunks.iter().map(|c| c.chunk.id.clone()).collect()
    }

    /// Render the chunks as prompt context, each block headed by its id
    pub fn context_string(&self) -> String {
        self.chunks
            .iter()
            .map(|c| format!("[{}]\n{}", c.chunk.id, c.chunk.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// BM25 retriever with corpus statistics precomputed at construction.
///
/// Ranking is a pure function of the query and the indexed corpus: ties keep
/// chunk insertion order.
#[derive(Debug, Clone)]
pub struct LexicalRetriever {
    store: ChunkStore,
    params: Bm25Params,
    doc_freq: HashMap<String, usize>,
    avg_len: f64,
}

impl LexicalRetriever {
    pub fn new(store: ChunkStore) -> Self {
        Self::with_params(store, Bm25Params::default())
    }

    pub fn with_params(store: ChunkStore, params: Bm25Params) -> Self {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut total_len = 0usize;
        for chunk in store.chunks() {
            total_len += chunk.stats.length;
            for term in chunk.stats.term_freq.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }
        let avg_len = if store.is_empty() {
            0.0
        } else {
            total_len as f64 / store.len() as f64
        };
        Self {
            store,
            params,
            doc_freq,
            avg_len,
        }
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Rank chunks against `query`, returning at most `min(top_k, 3)` entries.
    pub fn retrieve(&self, query: &str, top_k: usize) -> RetrievalResult {
        let limit = top_k.min(MAX_RETRIEVED);
        if limit == 0 || self.store.is_empty() {
            return RetrievalResult::empty();
        }

        // ordered so scores sum identically on every run
        let terms: BTreeSet<String> = tokenize(query).into_iter().collect();
        if terms.is_empty() {
            return RetrievalResult::empty();
        }

        let mut scored: Vec<ScoredChunk> = self
            .store
            .chunks()
            .iter()
            .map(|chunk| ScoredChunk {
                score: self.score(chunk, &terms),
                chunk: Arc::clone(chunk),
            })
            .filter(|s| s.score > 0.0)
            .collect();

        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);

        RetrievalResult { chunks: scored }
    }

    fn idf(&self, term: &str) -> f64 {
        let n = self.store.len() as f64;
        let df = self.doc_freq.get(term).copied().unwrap_or(0) as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn score(&self, chunk: &Chunk, terms: &BTreeSet<String>) -> f64 {
        let Bm25Params { k1, b } = self.params;
        let len_norm = if self.avg_len > 0.0 {
            chunk.stats.length as f64 / self.avg_len
        } else {
            0.0
        };
        terms
            .iter()
            .map(|term| {
                let tf = chunk.stats.frequency(term) as f64;
                if tf == 0.0 {
                    return 0.0;
                }
                self.idf(term) * (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * len_norm))
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::StructuralChunker;

    fn corpus() -> LexicalRetriever {
        let chunker = StructuralChunker::default();
        let mut chunks = chunker.chunk(
            "marketing_calendar",
            "# Marketing Calendar (1997)\n\
## Summer Beverages 1997\n\
- Dates: 1997-06-01 to 1997-06-30\n\
- Notes: Focus on Beverages and Condiments.\n\
\n\
## Winter Classics 1997\n\
- Dates: 1997-12-01 to 1997-12-31\n\
- Notes: Focus on Dairy Products and Confections.\n",
        );
        chunks.extend(chunker.chunk(
            "kpi_definitions",
            "# KPI Definitions\n\
## Average Order Value (AOV)\n\
- AOV = SUM(UnitPrice * Quantity * (1 - Discount)) / COUNT(DISTINCT OrderID)\n\
\n\
## Gross Margin\n\
- GM = SUM((UnitPrice - CostOfGoods) * Quantity * (1 - Discount))\n",
        ));
        chunks.extend(chunker.chunk(
            "product_policy",
            "# Returns & Policy\n\
- Perishables (Produce, Seafood, Dairy): 3-7 days.\n\
- Beverages unopened: 14 days; opened: no returns.\n",
        ));
        LexicalRetriever::new(ChunkStore::new(chunks))
    }

    #[test]
    fn test_retrieves_matching_section_first() {
        let result = corpus().retrieve("Summer Beverages 1997 dates", 3);
        assert!(!result.is_empty());
        assert_eq!(
            result.chunks[0].chunk.id.as_str(),
            "marketing_calendar::chunk0"
        );
    }

    #[test]
    fn test_result_is_bounded_and_sorted() {
        let result = corpus().retrieve("beverages dairy 1997 days", 10);
        assert!(result.len() <= MAX_RETRIEVED);
        for pair in result.chunks.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(result.chunks.iter().all(|c| c.score > 0.0));
    }

    #[test]
    fn test_no_overlap_is_empty() {
        let result = corpus().retrieve("quarterly churn forecast", 3);
        assert!(result.is_empty());
        assert_eq!(result.average_score(), 0.0);
    }

    #[test]
    fn test_stopword_only_query_is_empty() {
        assert!(corpus().retrieve("what is the", 3).is_empty());
    }

    #[test]
    fn test_top_k_zero_and_empty_store() {
        assert!(corpus().retrieve("beverages", 0).is_empty());
        let empty = LexicalRetriever::new(ChunkStore::default());
        assert!(empty.retrieve("beverages", 3).is_empty());
    }

    #[test]
    fn test_equal_scores_keep_corpus_order() {
        let text = "Beverages unopened may be returned within 14 days.";
        let retriever = LexicalRetriever::new(ChunkStore::new(vec![
            Chunk::new("policy_a", 0, text, 0),
            Chunk::new("policy_b", 0, text, 0),
            Chunk::new("unrelated", 0, "Winter catalog for dairy products.", 0),
        ]));

        let result = retriever.retrieve("beverages returned", 3);
        assert_eq!(result.len(), 2);
        assert_eq!(result.chunks[0].score, result.chunks[1].score);
        assert_eq!(result.chunks[0].chunk.id.as_str(), "policy_a::chunk0");
        assert_eq!(result.chunks[1].chunk.id.as_str(), "policy_b::chunk0");

        let top = retriever.retrieve("beverages returned", 1);
        assert_eq!(top.chunk_ids(), vec![ChunkId::new("policy_a", 0)]);
    }

    #[test]
    fn test_deterministic_ranking() {
        let retriever = corpus();
        let a = retriever.retrieve("AOV definition order value", 3).chunk_ids();
        let b = retriever.retrieve("AOV definition order value", 3).chunk_ids();
        assert_eq!(a, b);
        assert_eq!(a[0].as_str(), "kpi_definitions::chunk0");
    }

    #[test]
    fn test_context_string_has_ids() {
        let result = corpus().retrieve("beverages unopened returns", 1);
        let ctx = result.context_string();
        assert!(ctx.starts_with("[product_policy::chunk"));
        assert!(ctx.contains("14 days"));
    }
}
