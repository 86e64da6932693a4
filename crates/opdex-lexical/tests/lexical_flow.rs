use std::collections::HashMap;
use std::fs;

use tempfile::TempDir;

use opdex_core::error::Error;
use opdex_core::traits::{CandidateFilter, RelevanceModel};
use opdex_core::types::OpRecord;
use opdex_lexical::index::{record_tokens, LexicalIndex, LexicalIndexBuilder, RECORDS_FILE};
use opdex_lexical::tokenizer::tokenize;
use opdex_lexical::LexicalRetriever;

fn record(id: u32, path: &str, name: &str, summary: &str) -> OpRecord {
    OpRecord {
        id,
        path: path.to_string(),
        name: name.to_string(),
        summary: summary.to_string(),
        description: String::new(),
        tags: Vec::new(),
    }
}

fn incident_catalog() -> Vec<OpRecord> {
    vec![
        record(0, "/incidents", "listIncidents", "List all incidents"),
        record(1, "/incidents", "createIncident", "Open a new incident"),
    ]
}

fn build_retriever(records: &[OpRecord]) -> (TempDir, LexicalRetriever) {
    let tmp = TempDir::new().expect("tempdir");
    let index = LexicalIndexBuilder::new(tmp.path())
        .build(records, &HashMap::new())
        .expect("build");
    (tmp, LexicalRetriever::new(index))
}

#[test]
fn tokenize_splits_identifiers_into_stems() {
    let tokens = tokenize("createIncident");
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens, [tokenize("create"), tokenize("incident")].concat());

    let acronym = tokenize("XMLParser");
    assert_eq!(acronym.len(), 2);
    assert_eq!(acronym[0], "xml");
}

#[test]
fn tokenize_empty_and_separators() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("--__  ,,").is_empty());
    assert_eq!(tokenize("create-incident"), tokenize("create_incident"));
    assert_eq!(tokenize("create incident"), tokenize("createIncident"));
}

#[test]
fn tokenize_is_deterministic() {
    let a = tokenize("Acknowledge openIncidents quickly");
    let b = tokenize("Acknowledge openIncidents quickly");
    assert_eq!(a, b);
}

#[test]
fn record_tokens_inject_raw_identifier() {
    let r = record(0, "/incidents", "createIncident", "Open a new incident");
    let tokens = record_tokens(&r);
    assert!(tokens.contains(&"createIncident".to_string()));
}

#[test]
fn scenario_create_incident_ranks_create_first() {
    let (_tmp, retriever) = build_retriever(&incident_catalog());
    let results = retriever.search("create incident", 5).expect("search");
    assert!(!results.is_empty());
    assert_eq!(results[0].id, 1);
    assert!(results.len() <= 5);
}

/// Relevance model that scores everything equally, so the candidate
/// ordering from the coarse pass survives reranking unchanged.
struct FlatModel;

impl RelevanceModel for FlatModel {
    fn score(&self, _query: &str, _candidate: &str) -> anyhow::Result<f32> {
        Ok(0.0)
    }
}

#[test]
fn intersection_bonus_dominates_partial_matches() {
    // record 0 repeats the query words in its summary; only record 1
    // carries the raw identifier, so only it survives the intersection
    let records = vec![
        record(0, "/incidents", "listIncidents", "create incident create incident"),
        record(1, "/incidents", "createIncident", "Open a new incident"),
    ];
    let tmp = TempDir::new().expect("tempdir");
    let index = LexicalIndexBuilder::new(tmp.path())
        .build(&records, &HashMap::new())
        .expect("build");
    let retriever = LexicalRetriever::with_models(
        index,
        Box::new(FlatModel),
        Box::new(opdex_core::traits::NoopFilter),
    );

    let results = retriever.search("createIncident", 5).expect("search");
    assert_eq!(results[0].id, 1);
}

#[test]
fn intersection_bonus_fires_for_multi_word_queries() {
    // record 1 hits three expansions of "create" but only one query
    // token; record 0 contains every query token and must stay on top
    let records = vec![
        record(0, "/incidents", "createIncident", ""),
        record(1, "/files", "createFileHandle", "open new file"),
    ];
    let mut synonyms = HashMap::new();
    synonyms.insert(
        "create".to_string(),
        vec!["open".to_string(), "new".to_string(), "file".to_string()],
    );
    let tmp = TempDir::new().expect("tempdir");
    let index = LexicalIndexBuilder::new(tmp.path())
        .build(&records, &synonyms)
        .expect("build");
    let retriever = LexicalRetriever::with_models(
        index,
        Box::new(FlatModel),
        Box::new(opdex_core::traits::NoopFilter),
    );

    let results = retriever.search("create incident", 1).expect("search");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, 0);
}

#[test]
fn aborted_build_leaves_published_artifacts_intact() {
    let tmp = TempDir::new().expect("tempdir");
    let builder = LexicalIndexBuilder::new(tmp.path());
    builder
        .build(&incident_catalog(), &HashMap::new())
        .expect("build");
    let before = fs::read(tmp.path().join(RECORDS_FILE)).expect("read records");

    let catalog = tmp.path().join("catalog.json");
    fs::write(&catalog, "[{\"path\": \"/incidents\",").expect("write catalog");
    assert!(builder.build_from_catalog(&catalog, &HashMap::new()).is_err());

    let after = fs::read(tmp.path().join(RECORDS_FILE)).expect("read records");
    assert_eq!(after, before);
    let reloaded = LexicalIndex::load(tmp.path()).expect("load");
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn unseen_token_falls_back_to_tfidf() {
    let (_tmp, retriever) = build_retriever(&incident_catalog());
    let results = retriever.search("zzzqqq", 2).expect("search");
    assert!(!results.is_empty(), "fallback must not return an empty list");
    assert!(results.len() <= 2);
}

#[test]
fn empty_query_falls_back_and_stays_bounded() {
    let (_tmp, retriever) = build_retriever(&incident_catalog());
    let results = retriever.search("", 1).expect("search");
    assert!(results.len() <= 1);
    assert!(!results.is_empty());
}

#[test]
fn top_k_zero_returns_empty() {
    let (_tmp, retriever) = build_retriever(&incident_catalog());
    assert!(retriever.search("create incident", 0).expect("search").is_empty());
}

#[test]
fn top_k_bounds_hold_for_large_k() {
    let (_tmp, retriever) = build_retriever(&incident_catalog());
    let results = retriever.search("incident", 50).expect("search");
    assert!(results.len() <= 2);
}

#[test]
fn search_is_deterministic() {
    let (_tmp, retriever) = build_retriever(&incident_catalog());
    let a = retriever.search("incident", 5).expect("search");
    let b = retriever.search("incident", 5).expect("search");
    assert_eq!(a, b);
}

#[test]
fn artifacts_round_trip_through_disk() {
    let records = incident_catalog();
    let tmp = TempDir::new().expect("tempdir");
    let built = LexicalIndexBuilder::new(tmp.path())
        .build(&records, &HashMap::new())
        .expect("build");
    let from_build = LexicalRetriever::new(built)
        .search("create incident", 5)
        .expect("search");

    let loaded = LexicalIndex::load(tmp.path()).expect("load");
    assert_eq!(loaded.len(), 2);
    let from_disk = LexicalRetriever::new(loaded)
        .search("create incident", 5)
        .expect("search");

    assert_eq!(from_build, from_disk);
}

#[test]
fn load_without_artifacts_fails_fast() {
    let tmp = TempDir::new().expect("tempdir");
    let err = match LexicalIndex::load(tmp.path()) {
        Ok(_) => panic!("load must fail on an empty directory"),
        Err(e) => e,
    };
    assert!(matches!(err, Error::IndexNotBuilt(_)));
}

#[test]
fn synonym_expansion_recovers_paraphrased_queries() {
    let records = incident_catalog();
    let mut synonyms = HashMap::new();
    synonyms.insert("bug".to_string(), vec!["incident".to_string()]);

    let tmp = TempDir::new().expect("tempdir");
    let index = LexicalIndexBuilder::new(tmp.path())
        .build(&records, &synonyms)
        .expect("build");
    let retriever = LexicalRetriever::new(index);

    // "bug" appears nowhere in the corpus; the expansion still finds
    // the incident operations without hitting the tf-idf fallback path
    let results = retriever.search("bug", 5).expect("search");
    assert_eq!(results.len(), 2);
}

/// Filter suppressing list-style operations; keeps everything else in
/// the order it was given.
struct HideListOps;

impl CandidateFilter for HideListOps {
    fn apply(&self, records: Vec<OpRecord>) -> Vec<OpRecord> {
        records
            .into_iter()
            .filter(|r| !r.name.starts_with("list"))
            .collect()
    }
}

#[test]
fn filter_hook_preserves_order_of_survivors() {
    let records = incident_catalog();
    let tmp = TempDir::new().expect("tempdir");
    let index = LexicalIndexBuilder::new(tmp.path())
        .build(&records, &HashMap::new())
        .expect("build");
    let retriever = LexicalRetriever::with_models(
        index,
        Box::new(opdex_lexical::OverlapModel),
        Box::new(HideListOps),
    );

    let results = retriever.search("incident", 5).expect("search");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, 1);
}

/// Relevance model that fails on one specific candidate.
struct FailsOnCreate;

impl RelevanceModel for FailsOnCreate {
    fn score(&self, _query: &str, candidate: &str) -> anyhow::Result<f32> {
        if candidate.contains("createIncident") {
            anyhow::bail!("malformed candidate text");
        }
        Ok(1.0)
    }
}

#[test]
fn reranker_failure_drops_only_that_candidate() {
    let records = incident_catalog();
    let tmp = TempDir::new().expect("tempdir");
    let index = LexicalIndexBuilder::new(tmp.path())
        .build(&records, &HashMap::new())
        .expect("build");
    let retriever = LexicalRetriever::with_models(
        index,
        Box::new(FailsOnCreate),
        Box::new(opdex_core::traits::NoopFilter),
    );

    let results = retriever.search("incident", 5).expect("search");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, 0);
}
