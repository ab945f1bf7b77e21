//! Lightweight Ollama service for chat and batch embeddings.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/chat`: single-turn, non-streaming chat
//! - `POST {endpoint}/api/embed`: batch embeddings (`input` is an array)
//!
//! Every call runs under the configured timeout and the retry policy from
//! [`services::retry`].
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::{LlmModelConfig, OllamaService};
//! use services::retry::RetryPolicy;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     model: "nomic-embed-text".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     max_tokens: None,
//!     temperature: None,
//!     top_p: None,
//!     timeout_secs: Some(60),
//! };
//!
//! let svc = OllamaService::new(cfg, RetryPolicy::default())?;
//! let vecs = svc.embed_batch(&["Mechs have HP.".to_string()]).await?;
//! println!("dimension = {}", vecs[0].len());
//! # Ok(()) }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use services::retry::{RetryPolicy, retry_with_backoff};
use tracing::{debug, instrument};

use crate::config::llm_model_config::LlmModelConfig;
use crate::error_handler::{AiLlmError, Result, make_snippet};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// One message of a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// A `user` role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// the configured timeout. Provides:
/// - [`OllamaService::chat`]: single-turn chat
/// - [`OllamaService::embed_batch`]: one vector per input, input order kept
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    retry: RetryPolicy,
    url_chat: String,
    url_embed: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Config`] if the config does not validate
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig, retry: RetryPolicy) -> Result<Self> {
        cfg.validate()?;

        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        let base = cfg.endpoint.trim().trim_end_matches('/').to_string();
        let url_chat = format!("{}/api/chat", base);
        let url_embed = format!("{}/api/embed", base);

        Ok(Self {
            client,
            cfg,
            retry: retry.with_timeout(timeout),
            url_chat,
            url_embed,
        })
    }

    /// Model identifier this client talks to.
    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    /// Sends `prompt` as a single user message and returns the assistant reply.
    ///
    /// Mapped options:
    /// - `num_predict`  ← `self.cfg.max_tokens`
    /// - `temperature`  ← `self.cfg.temperature`
    /// - `top_p`        ← `self.cfg.top_p`
    ///
    /// # Errors
    /// - [`AiLlmError::HttpStatus`] for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] / [`AiLlmError::Timeout`] for transport failures
    /// - [`AiLlmError::Decode`] if the response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model, prompt_len = prompt.len()))]
    pub async fn chat(&self, prompt: &str) -> Result<ChatMessage> {
        let body = ChatRequest::from_cfg(&self.cfg, vec![ChatMessage::user(prompt)]);

        let out: ChatResponse = retry_with_backoff("ollama chat", &self.retry, || {
            self.post_json(&self.url_chat, &body)
        })
        .await?;

        Ok(out.message)
    }

    /// Embeds every input in one request; returns vectors in input order.
    ///
    /// An empty slice short-circuits without a request.
    ///
    /// # Errors
    /// - [`AiLlmError::EmptyEmbeddings`] if the response does not carry one
    ///   vector per input
    /// - transport/status/decode errors as for [`OllamaService::chat`]
    #[instrument(skip_all, fields(model = %self.cfg.model, inputs = inputs.len()))]
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbedRequest {
            model: &self.cfg.model,
            input: inputs,
        };

        let out: EmbedResponse = retry_with_backoff("ollama embed", &self.retry, || {
            self.post_json(&self.url_embed, &body)
        })
        .await?;

        if out.embeddings.len() != inputs.len() || out.embeddings.iter().any(|v| v.is_empty()) {
            return Err(AiLlmError::EmptyEmbeddings {
                requested: inputs.len(),
                returned: out.embeddings.iter().filter(|v| !v.is_empty()).count(),
            });
        }

        Ok(out.embeddings)
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("POST {}", url);
        let resp = self.client.post(url).json(body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AiLlmError::HttpStatus {
                status,
                url: url.to_string(),
                snippet: make_snippet(&text),
            });
        }

        resp.json::<R>()
            .await
            .map_err(|e| AiLlmError::Decode(format!("serde error from {url}: {e}")))
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/chat` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

impl<'a> ChatRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, messages: Vec<ChatMessage>) -> Self {
        let options = GenerateOptions {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        };

        Self {
            model: &cfg.model,
            messages,
            stream: false,
            options: (!options.is_empty()).then_some(options),
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl GenerateOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none() && self.num_predict.is_none()
    }
}

/// Response body for `/api/chat`.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Request body for `/api/embed`.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response body for `/api/embed`.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            model: "llama3.2".into(),
            endpoint: "http://localhost:11434/".into(),
            max_tokens: Some(256),
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn urls_are_normalized() {
        let svc = OllamaService::new(cfg(), RetryPolicy::default()).unwrap();
        assert_eq!(svc.url_chat, "http://localhost:11434/api/chat");
        assert_eq!(svc.url_embed, "http://localhost:11434/api/embed");
        assert_eq!(svc.retry.timeout, Duration::from_secs(5));
    }

    #[test]
    fn chat_request_shape() {
        let c = cfg();
        let req = ChatRequest::from_cfg(&c, vec![ChatMessage::user("hi")]);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["model"], "llama3.2");
        assert_eq!(v["stream"], false);
        assert_eq!(v["messages"][0]["role"], "user");
        assert_eq!(v["options"]["num_predict"], 256);
        assert!(v["options"].get("top_p").is_none());
    }

    #[test]
    fn embed_response_tolerates_missing_field() {
        let out: EmbedResponse = serde_json::from_str(r#"{"model":"m"}"#).unwrap();
        assert!(out.embeddings.is_empty());
    }

    #[tokio::test]
    async fn empty_batch_makes_no_request() {
        // Unroutable endpoint: a request would fail, an empty batch must not send one.
        let mut c = cfg();
        c.endpoint = "http://127.0.0.1:9".into();
        let svc = OllamaService::new(c, RetryPolicy::default()).unwrap();
        assert!(svc.embed_batch(&[]).await.unwrap().is_empty());
    }
}
