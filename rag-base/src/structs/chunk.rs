use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::rag_base_error::{RagBaseError, Result};

/// Metadata key holding the source document path.
pub const META_FILEPATH: &str = "filepath";
/// Metadata key holding the 1-based page number (page mode only).
pub const META_PAGE: &str = "page";

/// Size limits for the splitter, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkParams {
    pub chunk_length: usize,
    pub chunk_overlap: usize,
}

impl ChunkParams {
    /// Validated params; overlap must be smaller than the length.
    pub fn new(chunk_length: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_length == 0 {
            return Err(RagBaseError::InvalidConfig(
                "chunk length must be > 0".into(),
            ));
        }
        if chunk_overlap >= chunk_length {
            return Err(RagBaseError::InvalidConfig(format!(
                "chunk overlap {chunk_overlap} must be smaller than chunk length {chunk_length}"
            )));
        }
        Ok(Self {
            chunk_length,
            chunk_overlap,
        })
    }

    /// Length with a quarter of it as overlap (markdown loader default).
    pub fn quarter_overlap(chunk_length: usize) -> Result<Self> {
        Self::new(chunk_length, chunk_length / 4)
    }
}

/// Structural pass used before length splitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunkMode {
    /// Break at Markdown headers and horizontal rules.
    #[default]
    Markdown,
    /// Group by page (form-feed separated) and break at `***Subheader***` lines.
    Pages,
}

/// One chunk of a document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Non-empty values only.
    pub metadata: BTreeMap<String, String>,
}
