//! Generation seam and its Ollama adapter.

use std::sync::Arc;

use ai_llm_service::OllamaService;
use async_trait::async_trait;

use crate::error::ContextorError;

/// Single-turn text generation.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn model(&self) -> &str;

    /// Sends `prompt` as one user message and returns the reply text.
    async fn chat(&self, prompt: &str) -> Result<String, ContextorError>;
}

/// [`ChatProvider`] backed by an Ollama chat profile.
///
/// # Example
/// ```no_run
/// # use ai_llm_service::LlmServiceProfiles;
/// # use contextor::{ChatProvider, OllamaChat};
/// # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let profiles = LlmServiceProfiles::from_env(None, None)?;
/// let chat = OllamaChat::new(profiles.chat_service());
/// let out = chat.chat("What is a mech's HP?").await?;
/// println!("{out}");
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct OllamaChat {
    svc: Arc<OllamaService>,
}

impl OllamaChat {
    pub fn new(svc: Arc<OllamaService>) -> Self {
        Self { svc }
    }
}

#[async_trait]
impl ChatProvider for OllamaChat {
    fn model(&self) -> &str {
        self.svc.model()
    }

    async fn chat(&self, prompt: &str) -> Result<String, ContextorError> {
        self.svc
            .chat(prompt)
            .await
            .map(|m| m.content)
            .map_err(|source| ContextorError::Generation {
                model: self.svc.model().to_string(),
                source,
            })
    }
}
