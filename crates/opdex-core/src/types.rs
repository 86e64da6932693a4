//! Domain types shared by the lexical and semantic engines.

use serde::{Deserialize, Serialize};

/// Record identifiers are positions in the catalog order at build time
/// and double as the posting-list domain.
pub type RecordId = u32;

/// One structured unit of the API-operation catalog. Immutable once
/// built; indices reference it only by `id` and resolve the full
/// content through the record cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpRecord {
    pub id: RecordId,
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl OpRecord {
    /// The concatenated text the lexical index derives tokens from and
    /// the reranking pass scores against.
    pub fn index_text(&self) -> String {
        let mut parts = vec![self.path.clone(), self.name.clone()];
        parts.extend(self.tags.iter().cloned());
        parts.push(self.summary.clone());
        parts.push(self.description.clone());
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    /// Full serialized form, used as content identity during fusion.
    /// The fallback stays unique per record so a serialization failure
    /// can never collapse distinct records into one deduped hit.
    pub fn identity(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("op:{}:{}", self.id, self.name))
    }
}

/// A contiguous span of the prose guide, produced by the sliding-window
/// chunker and embedded for semantic search. Chunks carry no relation
/// to `OpRecord`s; the two corpora meet only at fusion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideChunk {
    pub id: String,
    pub doc_id: String,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// Indicates which retrieval path produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Lexical,
    Semantic,
}

/// A fused result: either a structured catalog hit or a prose passage.
/// Kept as a tagged union so consumers can match exhaustively instead
/// of shape-checking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Retrieved {
    Operation(OpRecord),
    Passage(GuideChunk),
}

impl Retrieved {
    /// Content identity used for deduplication across retrieval paths:
    /// a record dedupes by its full serialized form, a passage by its
    /// text content.
    pub fn identity(&self) -> String {
        match self {
            Retrieved::Operation(record) => record.identity(),
            Retrieved::Passage(chunk) => chunk.content.clone(),
        }
    }
}

/// One entry in the fused result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeHit {
    pub source: SourceKind,
    pub item: Retrieved,
}
