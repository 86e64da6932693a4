//! Catalog ingestion: parses the JSON operation catalog into records.
//!
//! A malformed catalog aborts the build before any artifact is touched,
//! so previously-published indexes stay intact.

use crate::error::{Error, Result};
use crate::types::{OpRecord, RecordId};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawOperation {
    path: String,
    #[serde(alias = "operation", alias = "operationId", alias = "operation_id")]
    name: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// Read and parse a catalog file.
pub fn load_catalog(path: &Path) -> Result<Vec<OpRecord>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::MalformedCatalog(format!("{}: {}", path.display(), e)))?;
    parse_catalog(&raw)
}

/// Parse a catalog from its raw JSON text. Record ids are assigned by
/// catalog order, which makes rebuilds reproducible for an unchanged
/// source file.
pub fn parse_catalog(raw: &str) -> Result<Vec<OpRecord>> {
    let operations: Vec<RawOperation> =
        serde_json::from_str(raw).map_err(|e| Error::MalformedCatalog(e.to_string()))?;

    let mut records = Vec::with_capacity(operations.len());
    for (i, op) in operations.into_iter().enumerate() {
        if op.name.trim().is_empty() {
            return Err(Error::MalformedCatalog(format!(
                "operation at position {i} has an empty name"
            )));
        }
        records.push(OpRecord {
            id: i as RecordId,
            path: op.path,
            name: op.name,
            summary: op.summary,
            description: op.description,
            tags: op.tags,
        });
    }
    Ok(records)
}
