//! Sliding-window chunker for the prose guide.
//!
//! Chunks are fixed-size character windows with overlap, so no sentence
//! boundary is permanently lost between consecutive chunks.

use crate::error::{Error, Result};
use crate::types::GuideChunk;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug)]
pub struct GuideChunker {
    config: ChunkingConfig,
}

impl GuideChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".into()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }

    /// Chunk a guide source: a single text file, or a directory walked
    /// for `.txt`/`.md` files in sorted order.
    pub fn chunk_source(&self, source: &Path) -> Result<Vec<GuideChunk>> {
        let files = if source.is_dir() {
            list_text_files(source)
        } else {
            vec![source.to_path_buf()]
        };

        let mut all_chunks = Vec::new();
        for file_path in &files {
            let content = fs::read_to_string(file_path)?;
            let doc_id = file_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "guide".to_string());
            all_chunks.extend(self.chunk_text(&doc_id, &content));
        }
        Ok(all_chunks)
    }

    /// Split `content` into overlapping windows of roughly
    /// `chunk_size` characters. The window advances by
    /// `chunk_size - chunk_overlap` so consecutive chunks share
    /// `chunk_overlap` characters.
    pub fn chunk_text(&self, doc_id: &str, content: &str) -> Vec<GuideChunk> {
        let chars: Vec<char> = content.chars().collect();
        if chars.iter().all(|c| c.is_whitespace()) {
            return Vec::new();
        }

        let size = self.config.chunk_size;
        let step = size - self.config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut chunk_index = 0;
        while start < chars.len() {
            let end = (start + size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            let trimmed = window.trim();
            if !trimmed.is_empty() {
                chunks.push(GuideChunk {
                    id: format!("{doc_id}:{chunk_index}"),
                    doc_id: doc_id.to_string(),
                    content: trimmed.to_string(),
                    chunk_index,
                    total_chunks: 0,
                });
                chunk_index += 1;
            }
            if end >= chars.len() {
                break;
            }
            start += step;
        }

        let total = chunks.len();
        for chunk in &mut chunks {
            chunk.total_chunks = total;
        }
        chunks
    }
}

fn list_text_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| {
            matches!(
                p.extension().and_then(|s| s.to_str()),
                Some("txt") | Some("md")
            )
        })
        .collect();
    files.sort();
    files
}
