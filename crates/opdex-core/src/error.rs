use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed catalog: {0}")]
    MalformedCatalog(String),

    #[error("Malformed synonym table: {0}")]
    MalformedSynonyms(String),

    #[error("Index not built: no artifacts under {0}")]
    IndexNotBuilt(PathBuf),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
