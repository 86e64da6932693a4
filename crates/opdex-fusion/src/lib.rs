//! Fusion layer: one query in, one mixed ranked list out.
//!
//! Invokes the lexical and semantic retrievers independently,
//! concatenates lexical results first, and deduplicates by content
//! identity. The two corpora answer structurally different question
//! types, so no cross-path score fusion is attempted; the downstream
//! consumer picks.

use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

use opdex_core::traits::{Embedder, OperationSearch, PassageSearch};
use opdex_core::types::{KnowledgeHit, Retrieved, SourceKind};
use opdex_lexical::{LexicalIndex, LexicalRetriever};
use opdex_semantic::{ChunkStore, SemanticRetriever};

pub struct KnowledgeRetriever {
    lexical: Box<dyn OperationSearch>,
    semantic: Box<dyn PassageSearch>,
}

impl KnowledgeRetriever {
    pub fn new(lexical: Box<dyn OperationSearch>, semantic: Box<dyn PassageSearch>) -> Self {
        Self { lexical, semantic }
    }

    /// Wire already-loaded artifacts into a retriever. Callers that
    /// inspect the index or store first (e.g. for the embedding
    /// dimension) build from here without reloading anything.
    pub fn from_parts(index: LexicalIndex, store: ChunkStore, embedder: Box<dyn Embedder>) -> Self {
        Self::new(
            Box::new(LexicalRetriever::new(index)),
            Box::new(SemanticRetriever::new(store, embedder)),
        )
    }

    /// Convenience constructor over a built artifact directory.
    pub fn from_artifacts(dir: &Path, embedder: Box<dyn Embedder>) -> Result<Self> {
        let index = LexicalIndex::load(dir)?;
        let store = ChunkStore::load(dir)?;
        Ok(Self::from_parts(index, store, embedder))
    }

    /// Fused, deduplicated results: lexical hits first, then semantic,
    /// each path capped at `top_k` on its own. A failure of one path is
    /// logged and the other path's results are returned; only when both
    /// fail does the query fail.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<KnowledgeHit>> {
        let lexical = self.lexical.search(query, top_k);
        let semantic = self.semantic.search(query, top_k);

        if let (Err(lex_err), Err(sem_err)) = (&lexical, &semantic) {
            return Err(anyhow!(
                "both retrieval paths failed: lexical: {lex_err}; semantic: {sem_err}"
            ));
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut hits = Vec::new();

        match lexical {
            Ok(records) => {
                for record in records {
                    let item = Retrieved::Operation(record);
                    if seen.insert(item.identity()) {
                        hits.push(KnowledgeHit {
                            source: SourceKind::Lexical,
                            item,
                        });
                    }
                }
            }
            Err(e) => warn!("lexical retriever failed, degrading to semantic only: {e}"),
        }

        match semantic {
            Ok(chunks) => {
                for chunk in chunks {
                    let item = Retrieved::Passage(chunk);
                    if seen.insert(item.identity()) {
                        hits.push(KnowledgeHit {
                            source: SourceKind::Semantic,
                            item,
                        });
                    }
                }
            }
            Err(e) => warn!("semantic retriever failed, degrading to lexical only: {e}"),
        }

        Ok(hits)
    }
}
