//! Embedding providers.
//!
//! The retrieval engine treats embedding as an opaque deterministic
//! function behind the `Embedder` trait. The default provider projects
//! xxHash-bucketed tokens into a fixed-dimension space and
//! L2-normalizes, which keeps offline builds and tests fully
//! reproducible without model weights. A model-backed provider slots in
//! behind the same trait.

use anyhow::Result;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use opdex_core::traits::Embedder;

pub const DEFAULT_DIM: usize = 256;

pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

pub fn default_embedder(dim: usize) -> Box<dyn Embedder> {
    Box::new(HashEmbedder::new(dim))
}
