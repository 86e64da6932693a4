use crate::types::{GuideChunk, OpRecord};

/// Embeds text into fixed-dimension vectors. Implementations must be
/// deterministic: build-time and query-time embeddings have to agree
/// for nearest-neighbor lookups to mean anything.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Pairwise query/candidate relevance scoring used by the fine
/// reranking pass. Scored per candidate so one bad candidate can be
/// dropped without failing the whole query.
pub trait RelevanceModel: Send + Sync {
    fn score(&self, query: &str, candidate: &str) -> anyhow::Result<f32>;
}

/// Post-reranking suppression hook for business rules (e.g. hiding
/// deprecated operations). Must preserve the relative order of the
/// records it keeps.
pub trait CandidateFilter: Send + Sync {
    fn apply(&self, records: Vec<OpRecord>) -> Vec<OpRecord>;
}

/// Passthrough filter.
pub struct NoopFilter;

impl CandidateFilter for NoopFilter {
    fn apply(&self, records: Vec<OpRecord>) -> Vec<OpRecord> {
        records
    }
}

pub trait OperationSearch: Send + Sync {
    fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<OpRecord>>;
}

pub trait PassageSearch: Send + Sync {
    fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<GuideChunk>>;
}
