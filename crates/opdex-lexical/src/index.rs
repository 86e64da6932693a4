//! Offline lexical index build and artifact management.
//!
//! The builder turns the parsed catalog into three read-only artifacts
//! (posting-list store, TF-IDF model, record cache) plus the synonym
//! table, all published write-to-temp-then-rename so concurrent readers
//! never observe a partial build.

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use opdex_core::catalog::load_catalog;
use opdex_core::error::{Error, Result};
use opdex_core::types::{OpRecord, RecordId};

use crate::tfidf::TfIdfIndex;
use crate::tokenizer::tokenize;

pub const POSTINGS_FILE: &str = "postings.json";
pub const TFIDF_FILE: &str = "tfidf.json";
pub const RECORDS_FILE: &str = "records.json";
pub const SYNONYMS_FILE: &str = "synonyms.json";

/// Posting artifact on disk: bitmaps flattened to sorted id runs.
#[derive(Serialize, Deserialize)]
struct PostingsArtifact {
    postings: BTreeMap<String, Vec<RecordId>>,
}

/// Synonym artifact: stem -> expansion stems, normalized at build time
/// so query tokens can be looked up directly.
#[derive(Serialize, Deserialize, Default)]
struct SynonymsArtifact {
    synonyms: BTreeMap<String, Vec<String>>,
}

/// In-memory lexical index. Immutable once built or loaded; safe to
/// share read-only across any number of concurrent queries.
pub struct LexicalIndex {
    postings: HashMap<String, RoaringBitmap>,
    tfidf: TfIdfIndex,
    records: Vec<OpRecord>,
    /// record lookup cache: id -> position in `records`
    by_id: HashMap<RecordId, usize>,
    synonyms: HashMap<String, Vec<String>>,
}

impl LexicalIndex {
    fn assemble(
        postings: HashMap<String, RoaringBitmap>,
        tfidf: TfIdfIndex,
        records: Vec<OpRecord>,
        synonyms: HashMap<String, Vec<String>>,
    ) -> Self {
        let by_id = records
            .iter()
            .enumerate()
            .map(|(pos, record)| (record.id, pos))
            .collect();
        Self {
            postings,
            tfidf,
            records,
            by_id,
            synonyms,
        }
    }

    /// Posting bitmap for a token. An unseen token is an empty bitmap,
    /// not an error.
    pub fn posting(&self, token: &str) -> RoaringBitmap {
        self.postings.get(token).cloned().unwrap_or_default()
    }

    pub fn record(&self, id: RecordId) -> Option<&OpRecord> {
        self.by_id.get(&id).and_then(|&pos| self.records.get(pos))
    }

    pub fn records(&self) -> &[OpRecord] {
        &self.records
    }

    pub fn synonyms_for(&self, token: &str) -> &[String] {
        self.synonyms.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tfidf(&self) -> &TfIdfIndex {
        &self.tfidf
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.postings.len()
    }

    /// Load previously-built artifacts. A directory without a complete
    /// artifact set fails fast with `IndexNotBuilt` rather than
    /// pretending the corpus is empty.
    pub fn load(dir: &Path) -> Result<Self> {
        for file in [POSTINGS_FILE, TFIDF_FILE, RECORDS_FILE] {
            if !dir.join(file).exists() {
                return Err(Error::IndexNotBuilt(dir.to_path_buf()));
            }
        }

        let artifact: PostingsArtifact =
            serde_json::from_slice(&fs::read(dir.join(POSTINGS_FILE))?)?;
        let postings = artifact
            .postings
            .into_iter()
            .map(|(token, ids)| (token, ids.into_iter().collect::<RoaringBitmap>()))
            .collect();

        let tfidf: TfIdfIndex = serde_json::from_slice(&fs::read(dir.join(TFIDF_FILE))?)?;
        let records: Vec<OpRecord> = serde_json::from_slice(&fs::read(dir.join(RECORDS_FILE))?)?;

        // synonyms are optional; an index built without a table still loads
        let synonyms = match fs::read(dir.join(SYNONYMS_FILE)) {
            Ok(bytes) => {
                let artifact: SynonymsArtifact = serde_json::from_slice(&bytes)?;
                artifact.synonyms.into_iter().collect()
            }
            Err(_) => HashMap::new(),
        };

        Ok(Self::assemble(postings, tfidf, records, synonyms))
    }
}

/// Token stream a record contributes to the index: stems of its
/// concatenated text fields, plus the raw operation identifier so
/// exact-identifier queries always hit.
pub fn record_tokens(record: &OpRecord) -> Vec<String> {
    let mut tokens = tokenize(&record.index_text());
    tokens.push(record.name.clone());
    tokens
}

/// Read and normalize a synonym table file (JSON `term -> [expansions]`).
pub fn load_synonyms(path: &Path) -> Result<HashMap<String, Vec<String>>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::MalformedSynonyms(format!("{}: {}", path.display(), e)))?;
    let table: HashMap<String, Vec<String>> =
        serde_json::from_str(&raw).map_err(|e| Error::MalformedSynonyms(e.to_string()))?;
    Ok(table)
}

pub struct LexicalIndexBuilder {
    out_dir: PathBuf,
}

impl LexicalIndexBuilder {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Parse a catalog file and build from it. A malformed catalog
    /// aborts before any artifact is written, so a previously-published
    /// set in `out_dir` stays loadable.
    pub fn build_from_catalog(
        &self,
        catalog: &Path,
        synonyms: &HashMap<String, Vec<String>>,
    ) -> Result<LexicalIndex> {
        let records = load_catalog(catalog)?;
        self.build(&records, synonyms)
    }

    /// Build the lexical artifacts from parsed records and a raw
    /// synonym table, persist them, and return the in-memory index.
    pub fn build(
        &self,
        records: &[OpRecord],
        synonyms: &HashMap<String, Vec<String>>,
    ) -> Result<LexicalIndex> {
        let streams: Vec<Vec<String>> = records.iter().map(record_tokens).collect();

        let mut postings: HashMap<String, RoaringBitmap> = HashMap::new();
        for (record, stream) in records.iter().zip(&streams) {
            for token in stream {
                postings.entry(token.clone()).or_default().insert(record.id);
            }
        }

        let tfidf = TfIdfIndex::fit(&streams);
        let normalized_synonyms = normalize_synonyms(synonyms);

        self.publish(&postings, &tfidf, records, &normalized_synonyms)?;
        info!(
            records = records.len(),
            tokens = postings.len(),
            "lexical index built"
        );

        Ok(LexicalIndex::assemble(
            postings,
            tfidf,
            records.to_vec(),
            normalized_synonyms,
        ))
    }

    /// Serialize every artifact to a temp file first, then rename all of
    /// them. A failure before the rename phase leaves any
    /// previously-published artifact set untouched.
    fn publish(
        &self,
        postings: &HashMap<String, RoaringBitmap>,
        tfidf: &TfIdfIndex,
        records: &[OpRecord],
        synonyms: &HashMap<String, Vec<String>>,
    ) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;

        let postings_artifact = PostingsArtifact {
            postings: postings
                .iter()
                .map(|(token, bitmap)| (token.clone(), bitmap.iter().collect()))
                .collect(),
        };
        let synonyms_artifact = SynonymsArtifact {
            synonyms: synonyms
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };

        let staged = [
            (POSTINGS_FILE, serde_json::to_vec_pretty(&postings_artifact)?),
            (TFIDF_FILE, serde_json::to_vec_pretty(tfidf)?),
            (RECORDS_FILE, serde_json::to_vec_pretty(&records)?),
            (SYNONYMS_FILE, serde_json::to_vec_pretty(&synonyms_artifact)?),
        ];

        let mut renames = Vec::new();
        for (name, bytes) in &staged {
            let tmp = self.out_dir.join(format!("{name}.tmp"));
            fs::write(&tmp, bytes)?;
            renames.push((tmp, self.out_dir.join(name)));
        }
        for (tmp, target) in renames {
            fs::rename(&tmp, &target)?;
        }
        Ok(())
    }
}

/// Stem both sides of the synonym table so lookups work on query
/// tokens. Multi-word keys are skipped (only single tokens can match a
/// query token); multi-word expansions contribute each of their stems.
fn normalize_synonyms(raw: &HashMap<String, Vec<String>>) -> HashMap<String, Vec<String>> {
    let mut normalized: HashMap<String, Vec<String>> = HashMap::new();
    for (key, expansions) in raw {
        let key_tokens = tokenize(key);
        if key_tokens.len() != 1 {
            continue;
        }
        let stems: Vec<String> = expansions.iter().flat_map(|e| tokenize(e)).collect();
        if stems.is_empty() {
            continue;
        }
        normalized.entry(key_tokens[0].clone()).or_default().extend(stems);
    }
    for stems in normalized.values_mut() {
        stems.sort();
        stems.dedup();
    }
    normalized
}
