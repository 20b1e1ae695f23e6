//! Markdown corpus loader
//!
//! Reads every `*.md` file directly under the corpus directory, in file name
//! order, and chunks each one. The chunk source is the file stem, so
//! `docs/product_policy.md` yields `product_policy::chunk0`, ...

use glob::glob;
use retail_domain::{Chunk, ChunkStore, StructuralChunker};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Invalid corpus pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct CorpusLoader {
    chunker: StructuralChunker,
}

impl CorpusLoader {
    pub fn new(max_chunk_chars: usize) -> Self {
        Self {
            chunker: StructuralChunker::new(max_chunk_chars),
        }
    }

    /// Load and chunk the corpus.
    ///
    /// A missing directory yields an empty store: retrieval then finds
    /// nothing and the pipeline still answers. An unreadable file is an error.
    pub fn load(&self, dir: &Path) -> Result<ChunkStore, CorpusError> {
        if !dir.is_dir() {
            warn!("Corpus directory {} not found, retrieval is disabled", dir.display());
            return Ok(ChunkStore::new(Vec::new()));
        }

        let pattern = dir.join("*.md");
        let mut paths: Vec<PathBuf> = glob(&pattern.to_string_lossy())?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Skipping unreadable corpus entry: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut chunks: Vec<Chunk> = Vec::new();
        for path in &paths {
            let text = fs::read_to_string(path).map_err(|source| CorpusError::Read {
                path: path.clone(),
                source,
            })?;
            if text.trim().is_empty() {
                debug!("Skipping empty document {}", path.display());
                continue;
            }
            let source = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let doc_chunks = self.chunker.chunk(&source, &text);
            debug!(
                "{}: {} chunks ({:?})",
                source,
                doc_chunks.len(),
                StructuralChunker::strategy_for(&text)
            );
            chunks.extend(doc_chunks);
        }

        info!(
            "Loaded {} chunks from {} documents in {}",
            chunks.len(),
            paths.len(),
            dir.display()
        );
        Ok(ChunkStore::new(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retail_domain::retrieval::DEFAULT_MAX_CHUNK_CHARS;

    fn loader() -> CorpusLoader {
        CorpusLoader::new(DEFAULT_MAX_CHUNK_CHARS)
    }

    #[test]
    fn test_loads_markdown_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("marketing_calendar.md"),
            concat!(
                "# Marketing Calendar (1997)\n\n",
                "## Summer Beverages 1997\n- Dates: 1997-06-01 to 1997-06-30\n\n",
                "## Winter Classics 1997\n- Dates: 1997-12-01 to 1997-12-31\n",
            ),
        )
        .unwrap();
        fs::write(
            dir.path().join("catalog.md"),
            "# Catalog Snapshot\nCategories include Beverages, Condiments, Confections.\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = loader().load(dir.path()).unwrap();
        assert_eq!(store.sources(), vec!["catalog", "marketing_calendar"]);
        let ids: Vec<_> = store.chunks().iter().map(|c| c.id.as_str().to_string()).collect();
        assert_eq!(
            ids,
            [
                "catalog::chunk0",
                "marketing_calendar::chunk0",
                "marketing_calendar::chunk1"
            ]
        );
    }

    #[test]
    fn test_missing_directory_is_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let store = loader().load(&dir.path().join("docs")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_document_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blank.md"), "  \n").unwrap();
        assert!(loader().load(dir.path()).unwrap().is_empty());
    }
}
