//! Collection preparation and batched inserts.
//!
//! Every store call goes through [`retry_with_backoff`], so a single flaky
//! request costs one retry instead of the whole run.

use indicatif::{ProgressBar, ProgressStyle};
use services::retry::{RetryPolicy, retry_with_backoff};
use tracing::{debug, info, warn};

use crate::config::VectorSpace;
use crate::errors::StoreError;
use crate::record::{BatchReport, OverwritePolicy, PrepareOutcome, StoreRecord};
use crate::vector_store::VectorStore;

/// Fails with [`StoreError::CollectionExists`] when `policy` forbids reusing
/// an existing `name`. Cheap; meant to run before any embedding work.
pub(crate) async fn ensure_allowed(
    store: &dyn VectorStore,
    retry: &RetryPolicy,
    name: &str,
    policy: OverwritePolicy,
) -> Result<bool, StoreError> {
    let exists = retry_with_backoff("collection exists", retry, || store.collection_exists(name))
        .await?;
    if exists && policy == OverwritePolicy::AbortIfExists {
        return Err(StoreError::CollectionExists(name.to_string()));
    }
    Ok(exists)
}

/// Leaves `name` ready for inserts according to `policy`.
///
/// - missing → created
/// - existing + `AbortIfExists` → error, nothing touched
/// - existing + `Overwrite` → deleted and recreated
/// - existing + `Merge` → reused as is
pub(crate) async fn prepare_collection(
    store: &dyn VectorStore,
    retry: &RetryPolicy,
    name: &str,
    space: &VectorSpace,
    policy: OverwritePolicy,
) -> Result<PrepareOutcome, StoreError> {
    let exists = ensure_allowed(store, retry, name, policy).await?;

    let outcome = match (exists, policy) {
        (true, OverwritePolicy::Merge) => {
            info!("Merging into existing collection '{}'", name);
            return Ok(PrepareOutcome::Reused);
        }
        (true, _) => {
            warn!("Overwriting existing collection '{}'", name);
            retry_with_backoff("delete collection", retry, || store.delete_collection(name))
                .await?;
            PrepareOutcome::Recreated
        }
        (false, _) => PrepareOutcome::Created,
    };

    retry_with_backoff("create collection", retry, || {
        store.create_collection(name, space)
    })
    .await?;
    info!("Collection '{}' ready ({:?})", name, outcome);
    Ok(outcome)
}

/// Inserts `records` in consecutive batches of `batch_size`.
///
/// Each batch is retried per `retry`. When a batch still fails, the error
/// names the batch and the indices of the batches already stored.
pub(crate) async fn insert_batched(
    store: &dyn VectorStore,
    retry: &RetryPolicy,
    name: &str,
    records: &[StoreRecord],
    batch_size: usize,
) -> Result<BatchReport, StoreError> {
    let batch_size = batch_size.max(1);
    let total_batches = records.len().div_ceil(batch_size);

    let pb = ProgressBar::new(total_batches as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} batches",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );

    let mut report = BatchReport {
        collection: name.to_string(),
        ..BatchReport::default()
    };
    let mut succeeded = Vec::with_capacity(total_batches);

    for (i, batch) in records.chunks(batch_size).enumerate() {
        let res = retry_with_backoff("add batch", retry, || store.add(name, batch)).await;
        match res {
            Ok(n) => {
                report.inserted += n;
                report.batches += 1;
                succeeded.push(i);
                pb.inc(1);
                debug!(
                    "Batch {} of {} (size {}) added to '{}'",
                    i + 1,
                    total_batches,
                    batch.len(),
                    name
                );
            }
            Err(e) => {
                pb.abandon();
                return Err(StoreError::BatchFailed {
                    collection: name.to_string(),
                    batch: i,
                    succeeded,
                    source: Box::new(e),
                });
            }
        }
    }

    pb.finish_and_clear();
    info!(
        "Inserted {} records into '{}' in {} batches",
        report.inserted, name, report.batches
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceKind;
    use crate::memory::InMemoryStore;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        }
    }

    fn space() -> VectorSpace {
        VectorSpace {
            size: 2,
            distance: DistanceKind::Cosine,
        }
    }

    fn records(n: usize) -> Vec<StoreRecord> {
        (0..n)
            .map(|i| StoreRecord {
                id: format!("doc.md_{i}"),
                document: format!("chunk {i}"),
                metadata: BTreeMap::new(),
                embedding: vec![1.0, i as f32],
            })
            .collect()
    }

    /// Delegates to an in-memory store; `add` fails permanently from call
    /// `fail_from` on, or only once at `flaky_at`.
    struct Faulty {
        inner: InMemoryStore,
        calls: AtomicUsize,
        fail_from: Option<usize>,
        flaky_at: Option<usize>,
    }

    impl Faulty {
        fn new(fail_from: Option<usize>, flaky_at: Option<usize>) -> Self {
            Self {
                inner: InMemoryStore::new(),
                calls: AtomicUsize::new(0),
                fail_from,
                flaky_at,
            }
        }
    }

    #[async_trait]
    impl VectorStore for Faulty {
        async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
            self.inner.list_collections().await
        }
        async fn create_collection(&self, n: &str, s: &VectorSpace) -> Result<(), StoreError> {
            self.inner.create_collection(n, s).await
        }
        async fn delete_collection(&self, n: &str) -> Result<(), StoreError> {
            self.inner.delete_collection(n).await
        }
        async fn add(&self, n: &str, r: &[StoreRecord]) -> Result<usize, StoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail_from.is_some_and(|f| call >= f) || self.flaky_at == Some(call);
            if fail {
                return Err(StoreError::AddFailed {
                    collection: n.into(),
                    reason: "connection reset".into(),
                });
            }
            self.inner.add(n, r).await
        }
        async fn query(
            &self,
            n: &str,
            v: &[Vec<f32>],
            k: usize,
        ) -> Result<Vec<Vec<String>>, StoreError> {
            self.inner.query(n, v, k).await
        }
        async fn count(&self, n: &str) -> Result<u64, StoreError> {
            self.inner.count(n).await
        }
    }

    #[tokio::test]
    async fn policy_decides_what_happens_to_existing_collection() {
        let store = InMemoryStore::new();
        let r = fast_retry();

        let out = prepare_collection(&store, &r, "c", &space(), OverwritePolicy::AbortIfExists)
            .await
            .unwrap();
        assert_eq!(out, PrepareOutcome::Created);
        insert_batched(&store, &r, "c", &records(3), 10).await.unwrap();

        let err = prepare_collection(&store, &r, "c", &space(), OverwritePolicy::AbortIfExists)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CollectionExists(_)));
        assert_eq!(store.count("c").await.unwrap(), 3);

        let out = prepare_collection(&store, &r, "c", &space(), OverwritePolicy::Merge)
            .await
            .unwrap();
        assert_eq!(out, PrepareOutcome::Reused);
        assert_eq!(store.count("c").await.unwrap(), 3);

        let out = prepare_collection(&store, &r, "c", &space(), OverwritePolicy::Overwrite)
            .await
            .unwrap();
        assert_eq!(out, PrepareOutcome::Recreated);
        assert_eq!(store.count("c").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn splits_into_batches() {
        let store = InMemoryStore::new();
        let r = fast_retry();
        store.create_collection("c", &space()).await.unwrap();

        let report = insert_batched(&store, &r, "c", &records(2500), 1000)
            .await
            .unwrap();
        assert_eq!(report.batches, 3);
        assert_eq!(report.inserted, 2500);
        assert_eq!(store.count("c").await.unwrap(), 2500);
    }

    #[tokio::test]
    async fn transient_batch_failure_is_retried() {
        let store = Faulty::new(None, Some(1));
        let r = fast_retry();
        store.create_collection("c", &space()).await.unwrap();

        let report = insert_batched(&store, &r, "c", &records(5), 2).await.unwrap();
        assert_eq!(report.batches, 3);
        assert_eq!(store.count("c").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn persistent_failure_reports_stored_batches() {
        let store = Faulty::new(Some(2), None);
        let r = fast_retry();
        store.create_collection("c", &space()).await.unwrap();

        let err = insert_batched(&store, &r, "c", &records(7), 2)
            .await
            .unwrap_err();
        match err {
            StoreError::BatchFailed {
                batch, succeeded, ..
            } => {
                assert_eq!(batch, 2);
                assert_eq!(succeeded, vec![0, 1]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.count("c").await.unwrap(), 4);
    }
}
