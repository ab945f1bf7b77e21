//! In-process [`VectorStore`] with brute-force similarity search.
//!
//! Used by tests and by `--store memory` runs; nothing is persisted.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::{DistanceKind, VectorSpace};
use crate::errors::StoreError;
use crate::record::StoreRecord;
use crate::vector_store::VectorStore;

#[derive(Debug)]
struct MemCollection {
    space: VectorSpace,
    records: Vec<StoreRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<BTreeMap<String, MemCollection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Higher is more similar.
fn similarity(kind: DistanceKind, a: &[f32], b: &[f32]) -> f32 {
    match kind {
        DistanceKind::Cosine => {
            let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if na == 0.0 || nb == 0.0 {
                0.0
            } else {
                dot / (na * nb)
            }
        }
        DistanceKind::Dot => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        DistanceKind::Euclid => -a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.collections.read().await.keys().cloned().collect())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, name: &str, space: &VectorSpace) -> Result<(), StoreError> {
        let mut guard = self.collections.write().await;
        if guard.contains_key(name) {
            return Err(StoreError::CollectionExists(name.to_string()));
        }
        guard.insert(
            name.to_string(),
            MemCollection {
                space: space.clone(),
                records: Vec::new(),
            },
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        self.collections.write().await.remove(name);
        Ok(())
    }

    async fn add(&self, name: &str, records: &[StoreRecord]) -> Result<usize, StoreError> {
        let mut guard = self.collections.write().await;
        let col = guard
            .get_mut(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;

        if let Some(bad) = records.iter().find(|r| r.embedding.len() != col.space.size) {
            return Err(StoreError::VectorSizeMismatch {
                got: bad.embedding.len(),
                want: col.space.size,
            });
        }

        for rec in records {
            match col.records.iter_mut().find(|r| r.id == rec.id) {
                Some(slot) => *slot = rec.clone(),
                None => col.records.push(rec.clone()),
            }
        }
        Ok(records.len())
    }

    async fn query(
        &self,
        name: &str,
        vectors: &[Vec<f32>],
        top_k: usize,
    ) -> Result<Vec<Vec<String>>, StoreError> {
        let guard = self.collections.read().await;
        let col = guard
            .get(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;

        let mut out = Vec::with_capacity(vectors.len());
        for q in vectors {
            if q.len() != col.space.size {
                return Err(StoreError::VectorSizeMismatch {
                    got: q.len(),
                    want: col.space.size,
                });
            }
            let mut scored: Vec<(f32, &StoreRecord)> = col
                .records
                .iter()
                .map(|r| (similarity(col.space.distance, q, &r.embedding), r))
                .collect();
            // Stable sort keeps insertion order among equal scores.
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            out.push(
                scored
                    .into_iter()
                    .take(top_k)
                    .map(|(_, r)| r.document.clone())
                    .collect(),
            );
        }
        Ok(out)
    }

    async fn count(&self, name: &str) -> Result<u64, StoreError> {
        let guard = self.collections.read().await;
        let col = guard
            .get(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;
        Ok(col.records.len() as u64)
    }
}
