//! Content-addressed on-disk cache of chunk embeddings.
//!
//! Cache files live under the directory derived from
//! `{prefix}/{algorithm}/{chunk_length}` and are named after a blake3 hash of
//! the model, the chunk parameters and every chunk text. Changing the source
//! document therefore changes the file name instead of silently reusing
//! vectors computed for other chunks.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use crate::embedding::EmbeddingsProvider;
use crate::errors::rag_base_error::{RagBaseError, Result};
use crate::loader::write_atomic;
use crate::structs::chunk::ChunkParams;

/// Vectors plus where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEmbeddings {
    pub vectors: Vec<Vec<f32>>,
    pub path: PathBuf,
    /// `true` when read from disk without calling the provider.
    pub hit: bool,
}

#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    dir: PathBuf,
}

impl EmbeddingCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Hex blake3 digest of everything the vectors depend on.
    pub fn key(model: &str, params: ChunkParams, chunks: &[String]) -> String {
        let mut h = blake3::Hasher::new();
        let mut field = |bytes: &[u8]| {
            h.update(&(bytes.len() as u64).to_le_bytes());
            h.update(bytes);
        };
        field(model.as_bytes());
        field(&(params.chunk_length as u64).to_le_bytes());
        field(&(params.chunk_overlap as u64).to_le_bytes());
        for c in chunks {
            field(c.as_bytes());
        }
        h.finalize().to_hex().to_string()
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Returns one vector per chunk, from disk when possible.
    ///
    /// With `overwrite = false` a cached file for the same key is trusted and
    /// the provider is not called. A cached file with the wrong number of
    /// vectors is treated as stale and recomputed.
    ///
    /// # Errors
    /// [`RagBaseError::EmbeddingUnavailable`] if the provider returns a
    /// different number of vectors than chunks.
    #[instrument(skip_all, fields(dir = %self.dir.display(), chunks = chunks.len()))]
    pub async fn get_or_compute(
        &self,
        provider: &dyn EmbeddingsProvider,
        params: ChunkParams,
        chunks: &[String],
        overwrite: bool,
    ) -> Result<CachedEmbeddings> {
        let key = Self::key(provider.model(), params, chunks);
        let path = self.path_for(&key);

        if !overwrite && path.is_file() {
            let vectors: Vec<Vec<f32>> = serde_json::from_slice(&fs::read(&path)?)?;
            if vectors.len() == chunks.len() {
                debug!("Loaded {} cached embeddings from {}", vectors.len(), path.display());
                return Ok(CachedEmbeddings {
                    vectors,
                    path,
                    hit: true,
                });
            }
            warn!(
                "Cached embeddings at {} hold {} vectors for {} chunks; recomputing",
                path.display(),
                vectors.len(),
                chunks.len()
            );
        }

        info!(
            "Embedding {} chunks with model '{}'",
            chunks.len(),
            provider.model()
        );
        let vectors = provider.embed_batch(chunks).await?;
        if vectors.len() != chunks.len() || vectors.iter().any(|v| v.is_empty()) {
            return Err(RagBaseError::EmbeddingUnavailable {
                model: provider.model().to_string(),
                detail: format!("{} vectors for {} chunks", vectors.len(), chunks.len()),
            });
        }

        write_atomic(&path, &serde_json::to_vec(&vectors)?)?;
        debug!("Cached embeddings at {}", path.display());

        Ok(CachedEmbeddings {
            vectors,
            path,
            hit: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic fake: vector = [len, first byte, call number].
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingsProvider for Counting {
        fn model(&self) -> &str {
            "fake-embed"
        }

        async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as f32;
            Ok(inputs
                .iter()
                .map(|s| vec![s.len() as f32, s.bytes().next().unwrap_or(0) as f32, call])
                .collect())
        }
    }

    struct Empty;

    #[async_trait]
    impl EmbeddingsProvider for Empty {
        fn model(&self) -> &str {
            "broken"
        }

        async fn embed_batch(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(Vec::new())
        }
    }

    fn chunks() -> Vec<String> {
        vec!["Mechs have HP.".into(), "Pilots have grit.".into()]
    }

    fn params() -> ChunkParams {
        ChunkParams::new(100, 25).unwrap()
    }

    #[tokio::test]
    async fn second_call_is_served_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EmbeddingCache::new(dir.path().join("lancer/fake-embed/100"));
        let provider = Counting {
            calls: AtomicUsize::new(0),
        };

        let first = cache
            .get_or_compute(&provider, params(), &chunks(), false)
            .await
            .unwrap();
        let second = cache
            .get_or_compute(&provider, params(), &chunks(), false)
            .await
            .unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(!first.hit);
        assert!(second.hit);
        assert_eq!(first.vectors, second.vectors);
        assert_eq!(first.path, second.path);
    }

    #[tokio::test]
    async fn overwrite_recomputes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EmbeddingCache::new(dir.path());
        let provider = Counting {
            calls: AtomicUsize::new(0),
        };

        cache
            .get_or_compute(&provider, params(), &chunks(), false)
            .await
            .unwrap();
        let again = cache
            .get_or_compute(&provider, params(), &chunks(), true)
            .await
            .unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(!again.hit);
    }

    #[tokio::test]
    async fn different_content_gets_a_different_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EmbeddingCache::new(dir.path());
        let provider = Counting {
            calls: AtomicUsize::new(0),
        };

        let a = cache
            .get_or_compute(&provider, params(), &chunks(), false)
            .await
            .unwrap();
        let mut edited = chunks();
        edited[1] = "Pilots have grit and a license level.".into();
        let b = cache
            .get_or_compute(&provider, params(), &edited, false)
            .await
            .unwrap();

        assert_ne!(a.path, b.path);
        assert!(!b.hit);
        assert_eq!(b.vectors.len(), 2);
    }

    #[tokio::test]
    async fn stale_file_with_wrong_count_is_recomputed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EmbeddingCache::new(dir.path());
        let provider = Counting {
            calls: AtomicUsize::new(0),
        };
        let key = EmbeddingCache::key("fake-embed", params(), &chunks());
        fs::write(cache.path_for(&key), "[[1.0]]").unwrap();

        let out = cache
            .get_or_compute(&provider, params(), &chunks(), false)
            .await
            .unwrap();
        assert!(!out.hit);
        assert_eq!(out.vectors.len(), 2);
    }

    #[tokio::test]
    async fn empty_response_is_an_error_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EmbeddingCache::new(dir.path());

        let err = cache
            .get_or_compute(&Empty, params(), &chunks(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, RagBaseError::EmbeddingUnavailable { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
