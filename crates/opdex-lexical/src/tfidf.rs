//! TF-IDF fallback index.
//!
//! A parallel vector-space representation of the record corpus, used
//! only when the posting-list path has a true coverage miss. Records
//! are L2-normalized sparse vectors; a query is projected into the same
//! space and compared by dot product.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfIdfIndex {
    /// term -> column in the idf table; BTreeMap keeps artifacts stable
    vocab: BTreeMap<String, u32>,
    idf: Vec<f32>,
    /// per-record sparse vectors indexed by record id, pairs sorted by column
    vectors: Vec<Vec<(u32, f32)>>,
}

impl TfIdfIndex {
    /// Fit the model over per-record token streams. Vectors are keyed
    /// by corpus position (the caller translates positions back to
    /// record ids).
    pub fn fit(docs: &[Vec<String>]) -> Self {
        let terms: BTreeSet<&String> = docs.iter().flatten().collect();
        let vocab: BTreeMap<String, u32> = terms
            .into_iter()
            .enumerate()
            .map(|(col, term)| (term.clone(), col as u32))
            .collect();

        let mut df = vec![0u32; vocab.len()];
        for doc in docs {
            let unique: BTreeSet<&String> = doc.iter().collect();
            for term in unique {
                if let Some(&col) = vocab.get(term) {
                    df[col as usize] += 1;
                }
            }
        }

        let n = docs.len() as f32;
        let idf: Vec<f32> = df
            .iter()
            .map(|&d| (n / (1.0 + d as f32)).ln() + 1.0)
            .collect();

        let vectors = docs
            .iter()
            .map(|doc| weigh(doc, &vocab, &idf))
            .collect();

        Self { vocab, idf, vectors }
    }

    /// Project a token stream into the fitted vector space.
    pub fn project(&self, tokens: &[String]) -> Vec<(u32, f32)> {
        weigh(tokens, &self.vocab, &self.idf)
    }

    /// Rank every document against the query tokens by dot product,
    /// descending. Returns corpus positions. Ties keep ascending
    /// position order (stable sort), so even an all-zero score vector
    /// yields a deterministic list.
    pub fn rank(&self, tokens: &[String], top_k: usize) -> Vec<(usize, f32)> {
        let query = self.project(tokens);
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(pos, vector)| (pos, dot(&query, vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// tf * idf weights for one token stream, L2-normalized, sorted by column.
fn weigh(tokens: &[String], vocab: &BTreeMap<String, u32>, idf: &[f32]) -> Vec<(u32, f32)> {
    let mut tf: HashMap<u32, f32> = HashMap::new();
    for token in tokens {
        if let Some(&col) = vocab.get(token) {
            *tf.entry(col).or_insert(0.0) += 1.0;
        }
    }
    let mut pairs: Vec<(u32, f32)> = tf
        .into_iter()
        .map(|(col, count)| (col, count * idf[col as usize]))
        .collect();
    pairs.sort_by_key(|&(col, _)| col);

    let norm: f32 = pairs.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for pair in &mut pairs {
            pair.1 /= norm;
        }
    }
    pairs
}

/// Sparse dot product over column-sorted pairs.
fn dot(a: &[(u32, f32)], b: &[(u32, f32)]) -> f32 {
    let mut sum = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}
