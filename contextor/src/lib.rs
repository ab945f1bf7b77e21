//! Query side of the RAG pipeline.
//!
//! Public API: [`ask`]. It embeds the question, retrieves the top-K documents
//! from `rag-store`, builds the rules prompt, calls the chat model and saves
//! the prompt/reply pair under the responses directory.

mod cfg;
mod error;
mod llm;
pub mod persist;
mod progress;
pub mod prompt;
mod retrieve;

pub use cfg::{DEFAULT_SUBJECT, DEFAULT_TOP_K, QueryConfig};
pub use error::ContextorError;
pub use llm::{ChatProvider, OllamaChat};
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use retrieve::retrieve_documents;

use std::path::PathBuf;

use rag_base::EmbeddingsProvider;
use rag_store::RagStore;
use tracing::{info, instrument};

/// One question against one collection.
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub collection: String,
    pub query: String,
    /// Documents to retrieve (`-d`).
    pub top_k: usize,
    /// Chunk-length label used in the artifact path (`-c`).
    pub chunk_label: String,
    /// Topic named in the prompt.
    pub subject: String,
    /// Root of persisted query/response pairs.
    pub responses_dir: PathBuf,
}

impl AskRequest {
    /// Request with `cfg` defaults and the `unknown` chunk label.
    pub fn new(
        cfg: &QueryConfig,
        collection: impl Into<String>,
        query: impl Into<String>,
        responses_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            collection: collection.into(),
            query: query.into(),
            top_k: cfg.top_k,
            chunk_label: "unknown".into(),
            subject: cfg.subject.clone(),
            responses_dir: responses_dir.into(),
        }
    }

    fn validate(&self) -> Result<(), ContextorError> {
        if self.query.trim().is_empty() {
            return Err(ContextorError::InvalidQuery("query is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(ContextorError::InvalidQuery("collection name is empty".into()));
        }
        if self.top_k == 0 {
            return Err(ContextorError::InvalidQuery("number of documents must be > 0".into()));
        }
        Ok(())
    }
}

/// Result of [`ask`].
#[derive(Debug, Clone)]
pub struct Answer {
    /// Full prompt sent to the model (also in `query.txt`).
    pub prompt: String,
    /// Model reply (also in `response.txt`).
    pub response: String,
    /// Retrieved documents, most similar first.
    pub documents: Vec<String>,
    /// Directory holding `query.txt` and `response.txt`.
    pub artifact_dir: PathBuf,
}

/// Answers `req.query` from the documents stored in `req.collection`.
///
/// Nothing is written to disk unless generation succeeds.
///
/// # Errors
/// - [`ContextorError::InvalidQuery`] for an empty query/collection or `top_k == 0`
/// - [`ContextorError::Embedding`] / [`ContextorError::Retrieval`] from the lookup
/// - [`ContextorError::Generation`] if the chat call fails
/// - [`ContextorError::Persist`] if the artifacts cannot be written
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use ai_llm_service::LlmServiceProfiles;
/// # use contextor::{ask, AskRequest, NoopProgress, OllamaChat, QueryConfig};
/// # use rag_base::OllamaEmbedder;
/// # use rag_store::{RagStore, StoreConfig};
/// # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let profiles = LlmServiceProfiles::from_env(None, None)?;
/// let embedder = OllamaEmbedder::new(profiles.embedding_service());
/// let chat = OllamaChat::new(profiles.chat_service());
/// let store = RagStore::qdrant(StoreConfig::from_env()?)?;
///
/// let req = AskRequest::new(&QueryConfig::from_env()?, "lancer_nomic-embed-text_1000",
///                           "How does overcharge work?", "./responses");
/// let answer = ask(&req, &embedder, &chat, &store, &NoopProgress).await?;
/// println!("{}", answer.response);
/// # Ok(()) }
/// ```
#[instrument(skip_all, fields(collection = %req.collection, top_k = req.top_k))]
pub async fn ask(
    req: &AskRequest,
    embedder: &dyn EmbeddingsProvider,
    chat: &dyn ChatProvider,
    store: &RagStore,
    progress: &dyn Progress,
) -> Result<Answer, ContextorError> {
    req.validate()?;

    progress.message("retrieving context");
    let documents =
        retrieve_documents(embedder, store, &req.collection, &req.query, req.top_k).await?;
    info!("Retrieved {} documents", documents.len());

    let prompt = prompt::build_prompt(&req.subject, &documents, &req.query);

    progress.message(&format!("asking {}", chat.model()));
    let response = chat.chat(&prompt).await?;

    let parent =
        persist::artifact_parent(&req.responses_dir, &req.collection, &req.chunk_label, req.top_k);
    let artifact_dir =
        persist::save_exchange(&parent, chrono::Utc::now().timestamp(), &prompt, &response)?;
    progress.finish("done");

    Ok(Answer {
        prompt,
        response,
        documents,
        artifact_dir,
    })
}
