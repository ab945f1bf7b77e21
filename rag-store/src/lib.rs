//! Vector store layer for the rules RAG pipeline.
//!
//! This crate provides:
//! - a backend-neutral [`VectorStore`] trait with a Qdrant and an in-memory
//!   implementation
//! - [`RagStore`], which adds timeouts/retries, the overwrite policy for
//!   existing collections, batched inserts and top-K retrieval

mod config;
mod errors;
mod ingest;
mod memory;
mod qdrant_facade;
mod record;
mod retrieve;
mod vector_store;

pub use config::{DEFAULT_INSERT_BATCH, DistanceKind, StoreConfig, VectorSpace};
pub use errors::StoreError;
pub use memory::InMemoryStore;
pub use qdrant_facade::QdrantFacade;
pub use record::{BatchReport, DOCUMENT_KEY, OverwritePolicy, PrepareOutcome, StoreRecord};
pub use vector_store::VectorStore;

use std::sync::Arc;

use services::retry::retry_with_backoff;
use tracing::trace;

/// High-level facade over a [`VectorStore`].
///
/// This is the single entry point recommended for application code.
#[derive(Clone)]
pub struct RagStore {
    cfg: StoreConfig,
    store: Arc<dyn VectorStore>,
}

impl RagStore {
    /// Connects to the Qdrant server named by `cfg`.
    ///
    /// # Errors
    /// Returns `StoreError::Config`/`Backend` if the client cannot be built.
    pub fn qdrant(cfg: StoreConfig) -> Result<Self, StoreError> {
        let store = Arc::new(QdrantFacade::new(&cfg)?);
        Ok(Self { cfg, store })
    }

    /// Wraps any backend (tests use [`InMemoryStore`]).
    pub fn with_store(cfg: StoreConfig, store: Arc<dyn VectorStore>) -> Self {
        Self { cfg, store }
    }

    /// Vector space for new collections of dimension `size`.
    pub fn space(&self, size: usize) -> VectorSpace {
        VectorSpace {
            size,
            distance: self.cfg.distance,
        }
    }

    pub async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        retry_with_backoff("list collections", &self.cfg.retry, || {
            self.store.list_collections()
        })
        .await
    }

    /// Fails early with [`StoreError::CollectionExists`] if `policy` would
    /// refuse `name`. Returns whether the collection exists.
    pub async fn ensure_allowed(
        &self,
        name: &str,
        policy: OverwritePolicy,
    ) -> Result<bool, StoreError> {
        trace!("RagStore::ensure_allowed name={name} policy={policy:?}");
        ingest::ensure_allowed(self.store.as_ref(), &self.cfg.retry, name, policy).await
    }

    /// Creates, recreates or reuses `name` according to `policy`.
    ///
    /// # Errors
    /// `StoreError::CollectionExists` under `AbortIfExists`; backend errors
    /// after retries.
    pub async fn prepare_collection(
        &self,
        name: &str,
        dimension: usize,
        policy: OverwritePolicy,
    ) -> Result<PrepareOutcome, StoreError> {
        trace!("RagStore::prepare_collection name={name} dim={dimension}");
        ingest::prepare_collection(
            self.store.as_ref(),
            &self.cfg.retry,
            name,
            &self.space(dimension),
            policy,
        )
        .await
    }

    /// Inserts records in batches of `cfg.insert_batch`.
    ///
    /// # Errors
    /// `StoreError::BatchFailed` when a batch fails after retries.
    pub async fn insert(
        &self,
        name: &str,
        records: &[StoreRecord],
    ) -> Result<BatchReport, StoreError> {
        trace!("RagStore::insert name={name} records={}", records.len());
        ingest::insert_batched(
            self.store.as_ref(),
            &self.cfg.retry,
            name,
            records,
            self.cfg.insert_batch,
        )
        .await
    }

    /// Top-K documents for a query vector, most similar first.
    ///
    /// # Errors
    /// `StoreError::CollectionNotFound` if `name` does not exist.
    pub async fn query_documents(
        &self,
        name: &str,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<String>, StoreError> {
        trace!("RagStore::query_documents name={name} top_k={top_k}");
        retrieve::query_documents(self.store.as_ref(), &self.cfg.retry, name, vector, top_k).await
    }

    pub async fn count(&self, name: &str) -> Result<u64, StoreError> {
        retry_with_backoff("count", &self.cfg.retry, || self.store.count(name))
            .await
    }
}
