//! Embedding provider seam and its Ollama adapter.

use std::sync::Arc;

use ai_llm_service::{AiLlmError, OllamaService};
use async_trait::async_trait;

use crate::errors::rag_base_error::{RagBaseError, Result};

/// Turns texts into vectors, one per input, in input order.
#[async_trait]
pub trait EmbeddingsProvider: Send + Sync {
    /// Model identifier; part of the embedding cache key.
    fn model(&self) -> &str;

    /// # Errors
    /// [`RagBaseError::EmbeddingUnavailable`] when the service returns no
    /// usable vectors.
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// [`EmbeddingsProvider`] backed by an Ollama embedding profile.
#[derive(Clone)]
pub struct OllamaEmbedder {
    svc: Arc<OllamaService>,
}

impl OllamaEmbedder {
    pub fn new(svc: Arc<OllamaService>) -> Self {
        Self { svc }
    }
}

#[async_trait]
impl EmbeddingsProvider for OllamaEmbedder {
    fn model(&self) -> &str {
        self.svc.model()
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        self.svc.embed_batch(inputs).await.map_err(|e| match e {
            AiLlmError::EmptyEmbeddings {
                requested,
                returned,
            } => RagBaseError::EmbeddingUnavailable {
                model: self.svc.model().to_string(),
                detail: format!("{returned} vectors for {requested} inputs"),
            },
            other => RagBaseError::Llm(other),
        })
    }
}
