//! Dense chunk store: offline build and persistence.
//!
//! Chunk embeddings are unit-normalized at build time, so nearest
//! neighbor is an exact dot-product scan, descending. The store is one
//! JSON artifact published write-to-temp-then-rename like the lexical
//! artifacts.

use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use opdex_core::error::Error as CoreError;
use opdex_core::traits::Embedder;
use opdex_core::types::GuideChunk;

pub const CHUNKS_FILE: &str = "chunks.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredChunk {
    chunk: GuideChunk,
    vector: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkStore {
    dim: usize,
    entries: Vec<StoredChunk>,
}

impl ChunkStore {
    /// Embed every chunk and assemble the store.
    pub fn build(chunks: &[GuideChunk], embedder: &dyn Embedder) -> anyhow::Result<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed_batch(&texts)?;
        if vectors.len() != chunks.len() {
            bail!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            );
        }
        let mut entries = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.iter().zip(vectors) {
            if vector.len() != embedder.dim() {
                bail!(
                    "embedding for chunk {} has dimension {} (expected {})",
                    chunk.id,
                    vector.len(),
                    embedder.dim()
                );
            }
            entries.push(StoredChunk {
                chunk: chunk.clone(),
                vector,
            });
        }
        info!(chunks = entries.len(), dim = embedder.dim(), "chunk store built");
        Ok(Self {
            dim: embedder.dim(),
            entries,
        })
    }

    pub fn save(&self, dir: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(dir)?;
        let tmp = dir.join(format!("{CHUNKS_FILE}.tmp"));
        fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&tmp, dir.join(CHUNKS_FILE))?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self, CoreError> {
        let path = dir.join(CHUNKS_FILE);
        if !path.exists() {
            return Err(CoreError::IndexNotBuilt(dir.to_path_buf()));
        }
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }

    /// Exact nearest-neighbor scan: every stored vector scored by dot
    /// product against the query vector, top `top_k` descending. Ties
    /// keep insertion order (stable sort).
    pub fn nearest(&self, query_vec: &[f32], top_k: usize) -> Vec<(GuideChunk, f32)> {
        let mut scored: Vec<(GuideChunk, f32)> = self
            .entries
            .iter()
            .map(|entry| (entry.chunk.clone(), dot(query_vec, &entry.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
