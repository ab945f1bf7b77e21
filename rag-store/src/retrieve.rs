//! Top-K document retrieval.

use services::retry::{RetryPolicy, retry_with_backoff};
use tracing::debug;

use crate::errors::StoreError;
use crate::vector_store::VectorStore;

/// Returns up to `top_k` documents for `vector`, most similar first.
///
/// A missing collection is reported as [`StoreError::CollectionNotFound`]
/// instead of a backend error.
pub(crate) async fn query_documents(
    store: &dyn VectorStore,
    retry: &RetryPolicy,
    name: &str,
    vector: Vec<f32>,
    top_k: usize,
) -> Result<Vec<String>, StoreError> {
    let exists = retry_with_backoff("collection exists", retry, || store.collection_exists(name))
        .await?;
    if !exists {
        return Err(StoreError::CollectionNotFound(name.to_string()));
    }
    if top_k == 0 {
        return Ok(Vec::new());
    }

    let vectors = [vector];
    let mut lists = retry_with_backoff("query", retry, || store.query(name, &vectors, top_k)).await?;
    let docs = if lists.is_empty() {
        Vec::new()
    } else {
        lists.swap_remove(0)
    };
    debug!("Retrieved {} documents from '{}'", docs.len(), name);
    Ok(docs)
}
