//! Backend-neutral vector store contract.

use async_trait::async_trait;

use crate::config::VectorSpace;
use crate::errors::StoreError;
use crate::record::StoreRecord;

/// Operations the ingestion and query pipelines need from a vector database.
///
/// Implementations perform a single attempt per call; timeouts and retries are
/// applied by [`crate::RagStore`].
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Names of all collections.
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.list_collections().await?.iter().any(|c| c == name))
    }

    /// Creates an empty collection; the collection must not exist.
    async fn create_collection(&self, name: &str, space: &VectorSpace) -> Result<(), StoreError>;

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError>;

    /// Inserts (or replaces by id) `records`; returns the number stored.
    async fn add(&self, name: &str, records: &[StoreRecord]) -> Result<usize, StoreError>;

    /// One ranked document list (most similar first, at most `top_k`) per query vector.
    async fn query(
        &self,
        name: &str,
        vectors: &[Vec<f32>],
        top_k: usize,
    ) -> Result<Vec<Vec<String>>, StoreError>;

    /// Number of records in the collection.
    async fn count(&self, name: &str) -> Result<u64, StoreError>;
}
