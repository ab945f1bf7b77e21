//! Ingest a small rules document into an in-memory store, then ask about it.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use contextor::persist::{QUERY_FILE, RESPONSE_FILE};
use contextor::prompt::NO_DOCUMENTS;
use contextor::{AskRequest, ChatProvider, ContextorError, NoopProgress, QueryConfig, ask};
use rag_base::{EmbeddingsProvider, IngestOutcome, IngestRequest, RagPaths, ingest_document};
use rag_store::{InMemoryStore, OverwritePolicy, RagStore, StoreConfig, StoreError};

/// Letter histogram; similar wording gives similar vectors.
struct LetterEmbedder;

#[async_trait]
impl EmbeddingsProvider for LetterEmbedder {
    fn model(&self) -> &str {
        "letters"
    }

    async fn embed_batch(&self, inputs: &[String]) -> rag_base::Result<Vec<Vec<f32>>> {
        Ok(inputs
            .iter()
            .map(|s| {
                let mut v = vec![0.0f32; 26];
                for b in s.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
                    v[(b - b'a') as usize] += 1.0;
                }
                v[0] += 0.01;
                v
            })
            .collect())
    }
}

/// Echoes the prompt length so the reply is never empty.
#[derive(Default)]
struct EchoChat {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatProvider for EchoChat {
    fn model(&self) -> &str {
        "echo"
    }

    async fn chat(&self, prompt: &str) -> Result<String, ContextorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("read {} chars of rules", prompt.len()))
    }
}

const DOC: &str = "# Hull\nHull adds hit points.\n\n\
     # Agility\nAgility adds evasion.\n\n\
     # Systems\nSystems add tech attack.\n";

struct Setup {
    _dir: tempfile::TempDir,
    paths: RagPaths,
    store: RagStore,
}

async fn setup_with_alpha() -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let paths = RagPaths::under(dir.path());
    fs::create_dir_all(&paths.data_dir).unwrap();
    fs::write(paths.input("alpha.md"), DOC).unwrap();

    let cfg = StoreConfig::from_lookup(|_| None).unwrap();
    let store = RagStore::with_store(cfg, Arc::new(InMemoryStore::new()));

    let mut req = IngestRequest::markdown(
        &paths,
        "alpha.md",
        "alpha",
        "letters",
        40,
        OverwritePolicy::AbortIfExists,
    )
    .unwrap();
    req.collection = "alpha".into();
    let out = ingest_document(&req, &LetterEmbedder, &store).await.unwrap();
    let IngestOutcome::Ingested(summary) = out else {
        panic!("expected ingestion");
    };
    assert_eq!(summary.chunks, 3);

    Setup {
        _dir: dir,
        paths,
        store,
    }
}

fn request(s: &Setup, collection: &str, top_k: usize) -> AskRequest {
    let mut req = AskRequest::new(
        &QueryConfig::default(),
        collection,
        "How many hit points does hull add?",
        &s.paths.responses_dir,
    );
    req.top_k = top_k;
    req.chunk_label = "40".into();
    req
}

#[tokio::test]
async fn three_chunks_top_two() {
    let s = setup_with_alpha().await;
    let chat = EchoChat::default();

    let req = request(&s, "alpha", 2);
    let answer = ask(&req, &LetterEmbedder, &chat, &s.store, &NoopProgress)
        .await
        .unwrap();

    assert_eq!(answer.documents.len(), 2);
    assert!(answer.documents[0].contains("Hull adds hit points."));
    for doc in &answer.documents {
        assert!(DOC.contains(doc.as_str()), "unexpected document {doc:?}");
        assert!(answer.prompt.contains(doc.as_str()));
    }

    let expected_parent = s.paths.responses_dir.join("alpha/40_chunks/2_docs");
    assert!(answer.artifact_dir.starts_with(expected_parent));
    let query = fs::read_to_string(answer.artifact_dir.join(QUERY_FILE)).unwrap();
    let response = fs::read_to_string(answer.artifact_dir.join(RESPONSE_FILE)).unwrap();
    assert_eq!(query, answer.prompt);
    assert!(!response.is_empty());
    assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_collection_uses_placeholder() {
    let s = setup_with_alpha().await;
    s.store
        .prepare_collection("empty", 26, OverwritePolicy::AbortIfExists)
        .await
        .unwrap();

    let chat = EchoChat::default();
    let req = request(&s, "empty", 5);
    let answer = ask(&req, &LetterEmbedder, &chat, &s.store, &NoopProgress)
        .await
        .unwrap();

    assert!(answer.documents.is_empty());
    let query = fs::read_to_string(answer.artifact_dir.join(QUERY_FILE)).unwrap();
    assert!(query.contains(NO_DOCUMENTS));
    assert!(!query.contains("---\n\n---"));
}

#[tokio::test]
async fn missing_collection_fails_without_artifacts() {
    let s = setup_with_alpha().await;
    let chat = EchoChat::default();

    let req = request(&s, "beta", 2);
    let err = ask(&req, &LetterEmbedder, &chat, &s.store, &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, ContextorError::Retrieval(StoreError::CollectionNotFound(_))));
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    assert!(!s.paths.responses_dir.exists());
}

#[tokio::test]
async fn zero_documents_requested_is_rejected() {
    let s = setup_with_alpha().await;
    let chat = EchoChat::default();
    let req = request(&s, "alpha", 0);
    let err = ask(&req, &LetterEmbedder, &chat, &s.store, &NoopProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, ContextorError::InvalidQuery(_)));
}
