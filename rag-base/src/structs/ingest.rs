use std::ops::Range;
use std::path::PathBuf;

use rag_store::{OverwritePolicy, PrepareOutcome};

use crate::errors::rag_base_error::Result;
use crate::structs::chunk::{ChunkMode, ChunkParams};
use crate::structs::rag_base_config::{RagPaths, collection_name};

/// Everything one ingestion run needs.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// File name under the data directory; record ids are `{input_filename}_{n}`.
    pub input_filename: String,
    pub source: PathBuf,
    /// Converted-text cache (PDF only).
    pub markdown_cache: Option<PathBuf>,
    /// Directory holding the content-addressed embedding files.
    pub embeddings_dir: PathBuf,
    pub collection: String,
    pub params: ChunkParams,
    pub mode: ChunkMode,
    pub pages: Option<Range<usize>>,
    pub policy: OverwritePolicy,
}

impl IngestRequest {
    /// Markdown source into `{prefix}_{algorithm}_{chunk_length}` with
    /// a quarter-length overlap.
    pub fn markdown(
        paths: &RagPaths,
        input_filename: &str,
        prefix: &str,
        algorithm: &str,
        chunk_length: usize,
        policy: OverwritePolicy,
    ) -> Result<Self> {
        Ok(Self {
            input_filename: input_filename.to_string(),
            source: paths.input(input_filename),
            markdown_cache: None,
            embeddings_dir: paths.embeddings_for(prefix, algorithm, chunk_length),
            collection: collection_name(prefix, algorithm, chunk_length),
            params: ChunkParams::quarter_overlap(chunk_length)?,
            mode: ChunkMode::Markdown,
            pages: None,
            policy,
        })
    }

    /// PDF source into `collection`, cached as `outputs/{collection}.md`.
    #[allow(clippy::too_many_arguments)]
    pub fn pdf(
        paths: &RagPaths,
        input_filename: &str,
        collection: &str,
        algorithm: &str,
        params: ChunkParams,
        pages: Option<Range<usize>>,
        mode: ChunkMode,
        policy: OverwritePolicy,
    ) -> Self {
        Self {
            input_filename: input_filename.to_string(),
            source: paths.input(input_filename),
            markdown_cache: Some(paths.markdown_cache(collection)),
            embeddings_dir: paths.embeddings_for(collection, algorithm, params.chunk_length),
            collection: collection.to_string(),
            params,
            mode,
            pages,
            policy,
        }
    }

    /// `--overwrite` also regenerates the markdown and embedding caches.
    pub fn refresh_caches(&self) -> bool {
        self.policy == OverwritePolicy::Overwrite
    }
}

/// Result of a run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Ingested(IngestSummary),
    /// Splitting produced no chunks; nothing was embedded or stored.
    NothingToIngest { source: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub collection: String,
    pub chunks: usize,
    pub batches: usize,
    pub prepared: PrepareOutcome,
    /// Embeddings came from the on-disk cache.
    pub embeddings_cached: bool,
}
