//! Ingestion pipeline: load → chunk → embed (cached) → prepare collection → insert.

use rag_store::{RagStore, StoreRecord};
use tracing::{info, instrument, warn};

use crate::chunker::chunk_document;
use crate::embedding::EmbeddingsProvider;
use crate::embedding_cache::EmbeddingCache;
use crate::errors::rag_base_error::{RagBaseError, Result};
use crate::loader::{LoadRequest, load_document};
use crate::structs::ingest::{IngestOutcome, IngestRequest, IngestSummary};

/// Runs one ingestion.
///
/// The collection policy is checked right after chunking, so a refused run
/// never calls the embedding service. A document that yields no chunks is
/// reported as [`IngestOutcome::NothingToIngest`], not as an error.
///
/// # Errors
/// - [`RagBaseError::MissingInput`] for an absent source
/// - [`RagBaseError::Store`] with `CollectionExists` under `AbortIfExists`
/// - [`RagBaseError::EmbeddingUnavailable`] / [`RagBaseError::Llm`] from the embedder
/// - [`RagBaseError::Store`] with `BatchFailed` when an insert batch fails
#[instrument(skip_all, fields(collection = %req.collection, source = %req.source.display()))]
pub async fn ingest_document(
    req: &IngestRequest,
    embedder: &dyn EmbeddingsProvider,
    store: &RagStore,
) -> Result<IngestOutcome> {
    let doc = load_document(&LoadRequest {
        source: req.source.clone(),
        cache: req.markdown_cache.clone(),
        overwrite: req.refresh_caches(),
        pages: req.pages.clone(),
    })?;

    let chunks = chunk_document(
        &doc.text,
        &req.source.display().to_string(),
        req.mode,
        req.params,
        doc.first_page,
    )?;
    if chunks.is_empty() {
        warn!(
            "No processable content found in {}",
            req.source.display()
        );
        return Ok(IngestOutcome::NothingToIngest {
            source: req.source.clone(),
        });
    }

    store.ensure_allowed(&req.collection, req.policy).await?;

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let cache = EmbeddingCache::new(&req.embeddings_dir);
    let embedded = cache
        .get_or_compute(embedder, req.params, &texts, req.refresh_caches())
        .await?;

    let dim = embedded
        .vectors
        .first()
        .map(Vec::len)
        .ok_or_else(|| RagBaseError::EmbeddingUnavailable {
            model: embedder.model().to_string(),
            detail: "no vectors".into(),
        })?;
    let prepared = store
        .prepare_collection(&req.collection, dim, req.policy)
        .await?;

    let records: Vec<StoreRecord> = chunks
        .into_iter()
        .zip(embedded.vectors)
        .enumerate()
        .map(|(i, (chunk, embedding))| StoreRecord {
            id: format!("{}_{}", req.input_filename, i),
            document: chunk.text,
            metadata: chunk.metadata,
            embedding,
        })
        .collect();

    let report = store.insert(&req.collection, &records).await?;
    info!(
        "Successfully loaded {} chunks from {} into collection {}",
        records.len(),
        req.input_filename,
        req.collection
    );

    Ok(IngestOutcome::Ingested(IngestSummary {
        collection: req.collection.clone(),
        chunks: records.len(),
        batches: report.batches,
        prepared,
        embeddings_cached: embedded.hit,
    }))
}
