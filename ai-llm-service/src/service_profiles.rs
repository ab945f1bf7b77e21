//! Shared LLM service with two active profiles: `chat` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once and hand the profile clients to the adapters in
//!   `rag-base` (embedding) and `contextor` (chat).
//! - Holds one HTTP client per profile; when both profiles point at the same
//!   endpoint they still get separate timeouts.
//!
//! # Example
//! ```no_run
//! use ai_llm_service::LlmServiceProfiles;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Env profiles, chat model overridden.
//!     let svc = LlmServiceProfiles::from_env(Some("mistral"), None)?;
//!
//!     let reply = svc.chat_service().chat("Hello world").await?;
//!     println!("CHAT: {}", reply.content);
//!
//!     let emb = svc.embedding_service().embed_batch(&["Ferris".to_string()]).await?;
//!     println!("Embedding dim = {}", emb[0].len());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use services::retry::RetryPolicy;
use tracing::debug;

use crate::config::default_config::{config_ollama_chat_from, config_ollama_embedding_from};
use crate::config::llm_model_config::LlmModelConfig;
use crate::error_handler::AiLlmError;
use crate::services::ollama_service::OllamaService;

/// Shared service that manages the **chat** and **embedding** profiles.
pub struct LlmServiceProfiles {
    chat: Arc<OllamaService>,
    embedding: Arc<OllamaService>,
}

impl LlmServiceProfiles {
    /// Creates a new service from explicit profiles.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if either profile is invalid or its HTTP client
    /// cannot be built.
    pub fn new(
        chat: LlmModelConfig,
        embedding: LlmModelConfig,
        retry: RetryPolicy,
    ) -> Result<Self, AiLlmError> {
        debug!(
            chat = %chat.model,
            embedding = %embedding.model,
            "LlmServiceProfiles::new"
        );
        Ok(Self {
            chat: Arc::new(OllamaService::new(chat, retry)?),
            embedding: Arc::new(OllamaService::new(embedding, retry)?),
        })
    }

    /// Builds both profiles and the retry policy through `lookup`.
    ///
    /// `chat_model` / `embedding_model` replace the configured model names
    /// (CLI `-m`, `-a`/`-e`).
    pub fn from_lookup(
        lookup: &impl Fn(&str) -> Option<String>,
        chat_model: Option<&str>,
        embedding_model: Option<&str>,
    ) -> Result<Self, AiLlmError> {
        let mut chat = config_ollama_chat_from(lookup)?;
        if let Some(m) = chat_model {
            chat = chat.with_model(m);
        }
        let mut embedding = config_ollama_embedding_from(lookup)?;
        if let Some(m) = embedding_model {
            embedding = embedding.with_model(m);
        }
        Self::new(chat, embedding, RetryPolicy::from_lookup(lookup))
    }

    /// [`LlmServiceProfiles::from_lookup`] over the process environment.
    pub fn from_env(
        chat_model: Option<&str>,
        embedding_model: Option<&str>,
    ) -> Result<Self, AiLlmError> {
        Self::from_lookup(&|k: &str| std::env::var(k).ok(), chat_model, embedding_model)
    }

    /// Shared handle to the **chat** profile client.
    pub fn chat_service(&self) -> Arc<OllamaService> {
        Arc::clone(&self.chat)
    }

    /// Shared handle to the **embedding** profile client.
    pub fn embedding_service(&self) -> Arc<OllamaService> {
        Arc::clone(&self.embedding)
    }

    /// Model names of the `(chat, embedding)` profiles.
    pub fn models(&self) -> (&str, &str) {
        (self.chat.model(), self.embedding.model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_env_models() {
        let env = |k: &str| match k {
            "OLLAMA_MODEL" => Some("llama3.1".to_string()),
            "EMBEDDING_MODEL" => Some("mxbai-embed-large".to_string()),
            _ => None,
        };
        let svc = LlmServiceProfiles::from_lookup(&env, None, None).unwrap();
        assert_eq!(svc.models(), ("llama3.1", "mxbai-embed-large"));

        let svc = LlmServiceProfiles::from_lookup(&env, Some("mistral"), Some("nomic-embed-text"))
            .unwrap();
        assert_eq!(svc.models(), ("mistral", "nomic-embed-text"));
        assert_eq!(svc.chat_service().model(), "mistral");
        assert_eq!(svc.embedding_service().model(), "nomic-embed-text");
    }

    #[test]
    fn invalid_endpoint_fails_before_any_request() {
        let env = |k: &str| (k == "OLLAMA_URL").then(|| "localhost:11434".to_string());
        assert!(LlmServiceProfiles::from_lookup(&env, None, None).is_err());
    }
}
