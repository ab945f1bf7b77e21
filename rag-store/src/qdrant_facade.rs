//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! All Qdrant calls live here, behind the [`VectorStore`] trait, so the rest
//! of the workspace never touches the builder API directly.

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::with_payload_selector::SelectorOptions;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PayloadIncludeSelector, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant, QdrantError};
use services::uuid::stable_uuid;
use tracing::{debug, info};

use crate::config::{DistanceKind, StoreConfig, VectorSpace};
use crate::errors::StoreError;
use crate::record::{DOCUMENT_KEY, StoreRecord};
use crate::vector_store::VectorStore;

/// [`VectorStore`] backed by a Qdrant server (gRPC).
pub struct QdrantFacade {
    client: Qdrant,
}

impl QdrantFacade {
    /// Builds the client; does not touch the server.
    ///
    /// Supports optional API key authentication.
    pub fn new(cfg: &StoreConfig) -> Result<Self, StoreError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url).timeout(cfg.retry.timeout);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::Backend(format!("client build: {e}")))?;

        Ok(Self { client })
    }
}

fn qdrant_distance(kind: DistanceKind) -> Distance {
    match kind {
        DistanceKind::Cosine => Distance::Cosine,
        DistanceKind::Dot => Distance::Dot,
        DistanceKind::Euclid => Distance::Euclid,
    }
}

fn to_point(rec: &StoreRecord) -> Result<PointStruct, StoreError> {
    let payload = Payload::try_from(rec.payload_json())
        .map_err(|e| StoreError::Backend(format!("payload convert for {}: {e}", rec.id)))?;
    Ok(PointStruct::new(
        stable_uuid(&rec.id).to_string(),
        rec.embedding.clone(),
        payload,
    ))
}

fn documents_only() -> SelectorOptions {
    SelectorOptions::Include(PayloadIncludeSelector {
        fields: vec![DOCUMENT_KEY.to_string()],
    })
}

/// gRPC codes for requests the server refused on their merits:
/// INVALID_ARGUMENT, NOT_FOUND, ALREADY_EXISTS, FAILED_PRECONDITION.
const REJECTION_CODES: [i32; 4] = [3, 5, 6, 9];

fn is_rejection_code(code: i32) -> bool {
    REJECTION_CODES.contains(&code)
}

/// Maps a client error to `transient(reason)` unless the server rejected the
/// request itself, which becomes the non-retryable [`StoreError::Rejected`].
fn classify(
    collection: &str,
    e: QdrantError,
    transient: impl FnOnce(String) -> StoreError,
) -> StoreError {
    match &e {
        QdrantError::ResponseError { status } if is_rejection_code(i32::from(status.code())) => {
            StoreError::Rejected {
                collection: collection.to_string(),
                reason: status.message().to_string(),
            }
        }
        _ => transient(e.to_string()),
    }
}

#[async_trait]
impl VectorStore for QdrantFacade {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let res = self
            .client
            .list_collections()
            .await
            .map_err(|e| classify("", e, StoreError::ListFailed))?;
        Ok(res.collections.into_iter().map(|c| c.name).collect())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        self.client
            .collection_exists(name)
            .await
            .map_err(|e| classify(name, e, StoreError::ListFailed))
    }

    async fn create_collection(&self, name: &str, space: &VectorSpace) -> Result<(), StoreError> {
        info!(
            "Creating collection '{}' with size={} distance={:?}",
            name, space.size, space.distance
        );
        self.client
            .create_collection(CreateCollectionBuilder::new(name).vectors_config(
                VectorParamsBuilder::new(space.size as u64, qdrant_distance(space.distance)),
            ))
            .await
            .map_err(|e| {
                classify(name, e, |reason| StoreError::CreateFailed {
                    collection: name.to_string(),
                    reason,
                })
            })?;
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        info!("Deleting collection '{}'", name);
        self.client
            .delete_collection(name)
            .await
            .map_err(|e| {
                classify(name, e, |reason| StoreError::DeleteFailed {
                    collection: name.to_string(),
                    reason,
                })
            })?;
        Ok(())
    }

    async fn add(&self, name: &str, records: &[StoreRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let points = records.iter().map(to_point).collect::<Result<Vec<_>, _>>()?;
        let n = points.len();

        let res = self
            .client
            .upsert_points(UpsertPointsBuilder::new(name, points).wait(true))
            .await
            .map_err(|e| {
                classify(name, e, |reason| StoreError::AddFailed {
                    collection: name.to_string(),
                    reason,
                })
            })?;
        debug!("Upsert into '{}' result={:?}", name, res.result);
        Ok(n)
    }

    async fn query(
        &self,
        name: &str,
        vectors: &[Vec<f32>],
        top_k: usize,
    ) -> Result<Vec<Vec<String>>, StoreError> {
        let mut out = Vec::with_capacity(vectors.len());
        for v in vectors {
            let res = self
                .client
                .search_points(
                    SearchPointsBuilder::new(name, v.clone(), top_k as u64)
                        .with_payload(documents_only()),
                )
                .await
                .map_err(|e| {
                    classify(name, e, |reason| StoreError::QueryFailed {
                        collection: name.to_string(),
                        reason,
                    })
                })?;

            let docs = res
                .result
                .into_iter()
                .filter_map(|sp| match sp.payload.get(DOCUMENT_KEY) {
                    Some(v) => match &v.kind {
                        Some(Kind::StringValue(s)) => Some(s.clone()),
                        _ => None,
                    },
                    None => None,
                })
                .collect::<Vec<_>>();
            debug!("Search in '{}' returned {} documents", name, docs.len());
            out.push(docs);
        }
        Ok(out)
    }

    async fn count(&self, name: &str) -> Result<u64, StoreError> {
        let res = self
            .client
            .count(CountPointsBuilder::new(name).exact(true))
            .await
            .map_err(|e| {
                classify(name, e, |reason| StoreError::QueryFailed {
                    collection: name.to_string(),
                    reason,
                })
            })?;
        Ok(res.result.map(|r| r.count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn point_id_is_stable_uuid_of_record_id() {
        let rec = StoreRecord {
            id: "rules.md_3".into(),
            document: "text".into(),
            metadata: BTreeMap::new(),
            embedding: vec![1.0, 0.0],
        };
        let a = to_point(&rec).unwrap();
        let b = to_point(&rec).unwrap();
        assert_eq!(a.id, b.id);
        assert!(a.payload.contains_key(DOCUMENT_KEY));
    }

    #[test]
    fn selector_requests_documents_only() {
        match documents_only() {
            SelectorOptions::Include(sel) => assert_eq!(sel.fields, vec!["document"]),
            other => panic!("unexpected selector: {other:?}"),
        }
    }

    #[test]
    fn server_rejections_are_not_retried() {
        use services::retry::Retryable;

        for code in [3, 5, 6, 9] {
            assert!(is_rejection_code(code), "code {code}");
        }
        // UNAVAILABLE, DEADLINE_EXCEEDED, INTERNAL stay retryable.
        for code in [14, 4, 13] {
            assert!(!is_rejection_code(code), "code {code}");
        }

        let client_side = classify("rules", QdrantError::ConversionError("bad".into()), |reason| {
            StoreError::QueryFailed {
                collection: "rules".into(),
                reason,
            }
        });
        assert!(client_side.is_transient());
        assert!(
            !StoreError::Rejected {
                collection: "rules".into(),
                reason: "wrong vector dimension".into(),
            }
            .is_transient()
        );
    }
}
