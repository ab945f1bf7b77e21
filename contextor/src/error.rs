//! Typed error for the contextor crate.

use ai_llm_service::AiLlmError;
use rag_base::RagBaseError;
use rag_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Query embedding failed (service down, model missing, empty response).
    #[error("query embedding failed: {0}")]
    Embedding(#[from] RagBaseError),

    /// Vector store lookup failed; `CollectionNotFound` carries its own hint.
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] StoreError),

    /// Chat call failed.
    #[error("generation with model '{model}' failed: {source}; is it pulled? (ollama pull {model})")]
    Generation {
        model: String,
        #[source]
        source: AiLlmError,
    },

    /// Query/response files could not be written.
    #[error("persisting query artifacts failed: {0}")]
    Persist(#[from] std::io::Error),

    /// Bad caller input (empty query, K = 0, ...).
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
