use std::fs;
use tempfile::TempDir;

use opdex_core::catalog::{load_catalog, parse_catalog};
use opdex_core::chunker::{ChunkingConfig, GuideChunker};
use opdex_core::error::Error;
use opdex_core::types::{OpRecord, Retrieved};

const CATALOG: &str = r#"[
  {"path": "/incidents", "operation": "listIncidents", "summary": "List all incidents"},
  {"path": "/incidents", "operation": "createIncident", "summary": "Open a new incident", "tags": ["incident"]}
]"#;

#[test]
fn parse_catalog_assigns_ids_by_order() {
    let records = parse_catalog(CATALOG).expect("parse");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, 0);
    assert_eq!(records[0].name, "listIncidents");
    assert_eq!(records[1].id, 1);
    assert_eq!(records[1].tags, vec!["incident".to_string()]);
}

#[test]
fn parse_catalog_rejects_malformed_json() {
    let err = parse_catalog("{not json").expect_err("must fail");
    assert!(matches!(err, Error::MalformedCatalog(_)));
}

#[test]
fn parse_catalog_rejects_empty_operation_name() {
    let raw = r#"[{"path": "/x", "operation": "  "}]"#;
    let err = parse_catalog(raw).expect_err("must fail");
    assert!(matches!(err, Error::MalformedCatalog(_)));
}

#[test]
fn load_catalog_missing_file_is_malformed() {
    let tmp = TempDir::new().expect("tempdir");
    let err = load_catalog(&tmp.path().join("nope.json")).expect_err("must fail");
    assert!(matches!(err, Error::MalformedCatalog(_)));
}

#[test]
fn chunker_window_and_overlap() {
    let chunker = GuideChunker::new(ChunkingConfig {
        chunk_size: 100,
        chunk_overlap: 20,
    })
    .expect("chunker");

    // 100 'a's + 100 'b's, no whitespace so trimming never shrinks a window
    let content: String = "a".repeat(100) + &"b".repeat(100);
    let chunks = chunker.chunk_text("guide", &content);

    assert!(chunks.len() >= 2);
    for chunk in &chunks {
        assert!(chunk.content.chars().count() <= 100);
        assert_eq!(chunk.total_chunks, chunks.len());
    }
    // consecutive windows share chunk_overlap characters
    let first: Vec<char> = chunks[0].content.chars().collect();
    let second: Vec<char> = chunks[1].content.chars().collect();
    assert_eq!(&first[first.len() - 20..], &second[..20]);
}

#[test]
fn chunker_rejects_overlap_not_smaller_than_size() {
    let err = GuideChunker::new(ChunkingConfig {
        chunk_size: 100,
        chunk_overlap: 100,
    })
    .expect_err("must fail");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn chunker_empty_input_yields_no_chunks() {
    let chunker = GuideChunker::with_defaults();
    assert!(chunker.chunk_text("guide", "").is_empty());
    assert!(chunker.chunk_text("guide", "   \n\t").is_empty());
}

#[test]
fn chunk_source_walks_directory_in_sorted_order() {
    let tmp = TempDir::new().expect("tempdir");
    fs::write(tmp.path().join("b.txt"), "second document body").expect("write");
    fs::write(tmp.path().join("a.md"), "first document body").expect("write");
    fs::write(tmp.path().join("skip.bin"), "ignored").expect("write");

    let chunker = GuideChunker::with_defaults();
    let chunks = chunker.chunk_source(tmp.path()).expect("chunk");
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].doc_id, "a");
    assert_eq!(chunks[1].doc_id, "b");
}

#[test]
fn retrieved_identity_separates_records_and_passages() {
    let record = OpRecord {
        id: 7,
        path: "/incidents".into(),
        name: "createIncident".into(),
        summary: "Open a new incident".into(),
        description: String::new(),
        tags: vec![],
    };
    let op = Retrieved::Operation(record.clone());
    assert_eq!(op.identity(), record.identity());
    assert!(op.identity().contains("createIncident"));

    // records differing only by id keep distinct identities, so
    // fusion can never collapse them into one hit
    let mut twin = record.clone();
    twin.id = 8;
    assert_ne!(twin.identity(), record.identity());
    assert!(!record.identity().is_empty());
}
