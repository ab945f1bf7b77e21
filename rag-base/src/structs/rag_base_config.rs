//! Configuration layer: reads directory layout from environment variables
//! and derives every on-disk path the pipelines use.

use std::path::{Path, PathBuf};

use crate::errors::rag_base_error::{RagBaseError, Result};

/// Root directories for inputs and derived artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagPaths {
    /// Source documents (`RAG_DATA_DIR`, default `./data`).
    pub data_dir: PathBuf,
    /// Markdown renderings of PDFs (`RAG_OUTPUTS_DIR`, default `./outputs`).
    pub outputs_dir: PathBuf,
    /// Embedding caches (`RAG_EMBEDDINGS_DIR`, default `./embeddings`).
    pub embeddings_dir: PathBuf,
    /// Query/response artifacts (`RAG_RESPONSES_DIR`, default `./responses`).
    pub responses_dir: PathBuf,
}

impl Default for RagPaths {
    fn default() -> Self {
        Self::under(".")
    }
}

impl RagPaths {
    /// Standard layout below `root`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            data_dir: root.join("data"),
            outputs_dir: root.join("outputs"),
            embeddings_dir: root.join("embeddings"),
            responses_dir: root.join("responses"),
        }
    }

    /// Reads overrides through `lookup`; unset variables keep the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let dir = |key: &str, default: PathBuf| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };
        let d = Self::default();
        Self {
            data_dir: dir("RAG_DATA_DIR", d.data_dir),
            outputs_dir: dir("RAG_OUTPUTS_DIR", d.outputs_dir),
            embeddings_dir: dir("RAG_EMBEDDINGS_DIR", d.embeddings_dir),
            responses_dir: dir("RAG_RESPONSES_DIR", d.responses_dir),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// `data/{filename}`.
    pub fn input(&self, filename: &str) -> PathBuf {
        self.data_dir.join(filename)
    }

    /// `outputs/{collection}.md`.
    pub fn markdown_cache(&self, collection: &str) -> PathBuf {
        self.outputs_dir.join(format!("{collection}.md"))
    }

    /// `embeddings/{prefix}/{algorithm}/{chunk_length}`.
    pub fn embeddings_for(&self, prefix: &str, algorithm: &str, chunk_length: usize) -> PathBuf {
        self.embeddings_dir
            .join(path_segment(prefix))
            .join(path_segment(algorithm))
            .join(chunk_length.to_string())
    }
}

/// `{prefix}_{algorithm}_{chunk_length}`, with characters Qdrant rejects
/// in collection names (`:` in `model:tag`, `/`) replaced by `-`.
pub fn collection_name(prefix: &str, algorithm: &str, chunk_length: usize) -> String {
    format!("{prefix}_{}_{chunk_length}", path_segment(algorithm))
}

fn path_segment(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Parses `A..B` (0-based, end exclusive) into a page range.
pub fn parse_page_range(s: &str) -> Result<std::ops::Range<usize>> {
    let bad = || RagBaseError::InvalidConfig(format!("page range '{s}' is not START..END"));
    let (a, b) = s.split_once("..").ok_or_else(bad)?;
    let start: usize = a.trim().parse().map_err(|_| bad())?;
    let end: usize = b.trim().parse().map_err(|_| bad())?;
    if start >= end {
        return Err(RagBaseError::InvalidConfig(format!(
            "page range '{s}' is empty"
        )));
    }
    Ok(start..end)
}
