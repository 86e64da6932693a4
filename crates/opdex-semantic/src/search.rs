//! Query-time semantic retrieval.

use anyhow::anyhow;

use opdex_core::traits::{Embedder, PassageSearch};
use opdex_core::types::GuideChunk;

use crate::store::ChunkStore;

/// Embeds the query with the same embedder used at build time and
/// scans the chunk store for the nearest passages. No lexical matching
/// and no reranking: this path is deliberately orthogonal to the
/// lexical retriever.
pub struct SemanticRetriever {
    store: ChunkStore,
    embedder: Box<dyn Embedder>,
}

impl SemanticRetriever {
    pub fn new(store: ChunkStore, embedder: Box<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<GuideChunk>> {
        if top_k == 0 || self.store.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self
            .embedder
            .embed_batch(&[query.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("embedder returned no vector for the query"))?;
        Ok(self
            .store
            .nearest(&query_vec, top_k)
            .into_iter()
            .map(|(chunk, _)| chunk)
            .collect())
    }
}

impl PassageSearch for SemanticRetriever {
    fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<GuideChunk>> {
        SemanticRetriever::search(self, query, top_k)
    }
}
