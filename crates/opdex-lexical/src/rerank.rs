//! Pairwise relevance models for the fine reranking pass.
//!
//! The default model is a deterministic token-overlap cross-scorer.
//! With the `reranker` feature a fastembed cross-encoder can take its
//! place behind the same trait.

use std::collections::HashSet;

use opdex_core::traits::RelevanceModel;

use crate::tokenizer::tokenize;

/// Fraction of query stems present in the candidate text, with an
/// exact-phrase bonus when the whole query appears verbatim
/// (case-insensitive).
#[derive(Debug, Default)]
pub struct OverlapModel;

impl RelevanceModel for OverlapModel {
    fn score(&self, query: &str, candidate: &str) -> anyhow::Result<f32> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Ok(0.0);
        }
        let candidate_tokens: HashSet<String> = tokenize(candidate).into_iter().collect();
        let hits = query_tokens
            .iter()
            .filter(|t| candidate_tokens.contains(*t))
            .count();
        let mut score = hits as f32 / query_tokens.len() as f32;
        if candidate.to_lowercase().contains(&query.to_lowercase()) {
            score += 0.5;
        }
        Ok(score)
    }
}

/// Cross-encoder model scoring `(query, candidate)` pairs directly.
#[cfg(feature = "reranker")]
pub struct CrossEncoderModel {
    model: fastembed::TextRerank,
}

#[cfg(feature = "reranker")]
impl CrossEncoderModel {
    pub fn new() -> anyhow::Result<Self> {
        let model = fastembed::TextRerank::try_new(Default::default())?;
        Ok(Self { model })
    }
}

#[cfg(feature = "reranker")]
impl RelevanceModel for CrossEncoderModel {
    fn score(&self, query: &str, candidate: &str) -> anyhow::Result<f32> {
        let results = self.model.rerank(query, vec![candidate], false, None)?;
        results
            .first()
            .map(|r| r.score)
            .ok_or_else(|| anyhow::anyhow!("cross-encoder returned no score"))
    }
}
