//! Unified error types for the crate.

use std::time::Duration;

use services::retry::Retryable;
use thiserror::Error;

/// Top-level error for vector store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Collection exists and the policy forbids touching it.
    #[error("collection '{0}' already exists; use --overwrite (or --policy merge) to change it")]
    CollectionExists(String),

    /// Collection does not exist.
    #[error("collection '{0}' not found; load documents into it first")]
    CollectionNotFound(String),

    #[error("listing collections failed: {0}")]
    ListFailed(String),

    #[error("creating collection '{collection}' failed: {reason}")]
    CreateFailed { collection: String, reason: String },

    #[error("deleting collection '{collection}' failed: {reason}")]
    DeleteFailed { collection: String, reason: String },

    /// One insert request failed (retryable at the call site).
    #[error("adding records to '{collection}' failed: {reason}")]
    AddFailed { collection: String, reason: String },

    /// A batch still failed after retries; earlier batches are already stored.
    #[error(
        "batch {batch} of '{collection}' failed after retries (stored batches: {succeeded:?}): {source}"
    )]
    BatchFailed {
        collection: String,
        batch: usize,
        succeeded: Vec<usize>,
        #[source]
        source: Box<StoreError>,
    },

    #[error("querying collection '{collection}' failed: {reason}")]
    QueryFailed { collection: String, reason: String },

    /// The server refused the request (bad argument, missing or duplicate
    /// resource); retrying cannot help.
    #[error("vector store rejected request on '{collection}': {reason}")]
    Rejected { collection: String, reason: String },

    /// Client construction / unexpected backend failures.
    #[error("vector store backend error: {0}")]
    Backend(String),

    /// Mismatch in vector dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Parallel sequences of a batch differ in length.
    #[error("batch sequences differ in length: {0}")]
    LengthMismatch(String),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    #[error("vector store call timed out after {0:?}")]
    Timeout(Duration),
}

impl Retryable for StoreError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::ListFailed(_)
                | StoreError::CreateFailed { .. }
                | StoreError::DeleteFailed { .. }
                | StoreError::AddFailed { .. }
                | StoreError::QueryFailed { .. }
                | StoreError::Backend(_)
                | StoreError::Timeout(_)
        )
    }

    fn timed_out(after: Duration) -> Self {
        StoreError::Timeout(after)
    }
}
