//! Query-time lexical retrieval.
//!
//! Coarse candidate generation over posting bitmaps (intersection bonus
//! + per-token accumulation), TF-IDF fallback on a true coverage miss,
//! then a fine reranking pass and the suppression hook over the
//! shortlist only.

use roaring::RoaringBitmap;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, warn};

use opdex_core::traits::{CandidateFilter, NoopFilter, OperationSearch, RelevanceModel};
use opdex_core::types::{OpRecord, RecordId};

use crate::index::LexicalIndex;
use crate::rerank::OverlapModel;
use crate::tokenizer::tokenize;

/// Bonus granted when a record sits in the intersection of every query
/// token's posting list. Tunable; only has to dominate any realistic
/// partial-match accumulation.
pub const INTERSECTION_BONUS: i64 = 100;
/// Increment per individual token list containing a record.
pub const PARTIAL_MATCH_SCORE: i64 = 1;

pub struct LexicalRetriever {
    index: LexicalIndex,
    relevance: Box<dyn RelevanceModel>,
    filter: Box<dyn CandidateFilter>,
}

impl LexicalRetriever {
    pub fn new(index: LexicalIndex) -> Self {
        Self::with_models(index, Box::new(OverlapModel), Box::new(NoopFilter))
    }

    pub fn with_models(
        index: LexicalIndex,
        relevance: Box<dyn RelevanceModel>,
        filter: Box<dyn CandidateFilter>,
    ) -> Self {
        Self {
            index,
            relevance,
            filter,
        }
    }

    pub fn index(&self) -> &LexicalIndex {
        &self.index
    }

    /// Ranked records for `query`, at most `top_k` of them.
    pub fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<OpRecord>> {
        if top_k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }
        let shortlist = self.candidates(query, top_k);
        let reranked = self.rerank(query, shortlist);
        let records: Vec<OpRecord> = reranked
            .iter()
            .filter_map(|&id| self.index.record(id).cloned())
            .collect();
        let mut kept = self.filter.apply(records);
        kept.truncate(top_k);
        Ok(kept)
    }

    /// Coarse candidate generation: additive posting-list scoring with
    /// TF-IDF fallback. Ties break by first-seen order (stable sort
    /// over insertion order), so results are deterministic.
    fn candidates(&self, query: &str, top_k: usize) -> Vec<RecordId> {
        let tokens = tokenize(query);

        let expansions: Vec<String> = tokens
            .iter()
            .flat_map(|t| self.index.synonyms_for(t))
            .cloned()
            .collect();

        let lists: Vec<RoaringBitmap> =
            tokens.iter().map(|t| self.index.posting(t)).collect();
        // the raw query has its own posting list when it is a verbatim
        // operation identifier, via the raw-name injection at build time
        let raw = query.trim();
        let raw_list = if raw.is_empty() {
            RoaringBitmap::new()
        } else {
            self.index.posting(raw)
        };

        let mut order: Vec<RecordId> = Vec::new();
        let mut scores: HashMap<RecordId, i64> = HashMap::new();

        // full intersection first: the strongest lexical signal. Only
        // the stemmed query tokens participate; the raw-query list is
        // empty for any multi-word query and would void the bonus.
        if let Some((head, tail)) = lists.split_first() {
            let mut intersection = head.clone();
            for list in tail {
                intersection &= list;
            }
            for id in intersection.iter() {
                bump(&mut order, &mut scores, id, INTERSECTION_BONUS);
            }
        }
        // a verbatim identifier match carries the same weight
        for id in raw_list.iter() {
            bump(&mut order, &mut scores, id, INTERSECTION_BONUS);
        }

        // partial-match accumulation over the union
        for list in lists.iter().chain(std::iter::once(&raw_list)) {
            for id in list.iter() {
                bump(&mut order, &mut scores, id, PARTIAL_MATCH_SCORE);
            }
        }
        // synonym expansions join the accumulation but never the
        // intersection, so they cannot dilute exact-match dominance
        for token in &expansions {
            for id in self.index.posting(token).iter() {
                bump(&mut order, &mut scores, id, PARTIAL_MATCH_SCORE);
            }
        }

        if scores.is_empty() {
            // true coverage miss: every token list was empty
            debug!(query, "coverage miss, falling back to tf-idf ranking");
            return self
                .index
                .tfidf()
                .rank(&tokenize(query), top_k)
                .into_iter()
                .filter_map(|(pos, _)| self.index.records().get(pos).map(|r| r.id))
                .collect();
        }

        let mut ranked: Vec<(RecordId, i64)> =
            order.iter().map(|&id| (id, scores[&id])).collect();
        ranked.sort_by_key(|&(_, score)| std::cmp::Reverse(score));
        ranked.truncate(top_k);
        ranked.into_iter().map(|(id, _)| id).collect()
    }

    /// Fine pass: pairwise relevance over the shortlist. A model
    /// failure drops that candidate only, preserving partial results.
    fn rerank(&self, query: &str, shortlist: Vec<RecordId>) -> Vec<RecordId> {
        let mut scored: Vec<(RecordId, f32)> = Vec::with_capacity(shortlist.len());
        for id in shortlist {
            let Some(record) = self.index.record(id) else {
                continue;
            };
            match self.relevance.score(query, &record.index_text()) {
                Ok(score) => scored.push((id, score)),
                Err(e) => {
                    warn!(record = id, "relevance model failed, dropping candidate: {e}");
                }
            }
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(id, _)| id).collect()
    }
}

impl OperationSearch for LexicalRetriever {
    fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<OpRecord>> {
        LexicalRetriever::search(self, query, top_k)
    }
}

fn bump(
    order: &mut Vec<RecordId>,
    scores: &mut HashMap<RecordId, i64>,
    id: RecordId,
    amount: i64,
) {
    match scores.entry(id) {
        Entry::Occupied(mut entry) => *entry.get_mut() += amount,
        Entry::Vacant(entry) => {
            entry.insert(amount);
            order.push(id);
        }
    }
}
