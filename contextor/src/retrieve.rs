//! Query embedding + top-K lookup, no generation.

use rag_base::{EmbeddingsProvider, RagBaseError};
use rag_store::RagStore;
use tracing::{debug, instrument};

use crate::error::ContextorError;

/// Embeds `query` live (never cached) and returns up to `top_k` documents
/// from `collection`, most similar first.
///
/// # Errors
/// - [`ContextorError::Embedding`] if the query cannot be embedded
/// - [`ContextorError::Retrieval`] if the collection is missing or the search fails
#[instrument(skip_all, fields(collection = %collection, top_k))]
pub async fn retrieve_documents(
    embedder: &dyn EmbeddingsProvider,
    store: &RagStore,
    collection: &str,
    query: &str,
    top_k: usize,
) -> Result<Vec<String>, ContextorError> {
    let mut vectors = embedder.embed_batch(&[query.to_string()]).await?;
    let vector = match vectors.pop() {
        Some(v) if !v.is_empty() => v,
        _ => {
            return Err(RagBaseError::EmbeddingUnavailable {
                model: embedder.model().to_string(),
                detail: "no vector for the query".into(),
            }
            .into());
        }
    };
    debug!(dim = vector.len(), "query embedded");

    Ok(store.query_documents(collection, vector, top_k).await?)
}
