//! Unified error type for the rag-base crate.

use std::path::PathBuf;

use ai_llm_service::AiLlmError;
use rag_store::StoreError;
use thiserror::Error;

/// Unified result alias for the crate.
pub type Result<T> = std::result::Result<T, RagBaseError>;

/// Errors produced by loading, chunking, embedding and ingesting documents.
#[derive(Debug, Error)]
pub enum RagBaseError {
    // ── Configuration ────────────────────────────────────────────────────────
    /// Failed to parse an environment variable into the expected type.
    #[error("failed to parse env variable: {key} = '{value}'")]
    EnvParse { key: String, value: String },

    /// Configuration combination is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Inputs ───────────────────────────────────────────────────────────────
    /// Source document does not exist; nothing was written.
    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// PDF text extraction failed.
    #[error("pdf extraction failed for {}: {reason}", path.display())]
    Pdf { path: PathBuf, reason: String },

    // ── Embeddings backend ───────────────────────────────────────────────────
    /// The embedding service answered without one vector per input.
    #[error(
        "embedding service returned no usable vectors ({detail}); is the model pulled? (ollama pull {model})"
    )]
    EmbeddingUnavailable { model: String, detail: String },

    /// Any other embedding/generation client failure.
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    // ── Vector store ─────────────────────────────────────────────────────────
    #[error(transparent)]
    Store(#[from] StoreError),

    // ── I/O & serialization ──────────────────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
