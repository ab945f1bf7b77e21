//! Default Ollama configs resolved from environment variables.
//!
//! Two roles are used by the workspace:
//!
//! - **Chat**      → answer generation (`llama3.2` by default)
//! - **Embedding** → vector generation (`nomic-embed-text` by default)
//!
//! # Environment variables
//!
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (default `http://localhost:11434`)
//! - `OLLAMA_MODEL`                = chat model
//! - `EMBEDDING_MODEL`             = embedding model
//! - `LLM_MAX_TOKENS`              = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS`            = chat timeout (default 600)
//! - `EMBEDDING_TIMEOUT_SECS`      = embedding timeout (default 120)
//!
//! Both builders take a lookup closure instead of reading the process
//! environment; `LlmServiceProfiles::from_env` passes `std::env::var`.

use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::{AiLlmError, ConfigError, non_empty, opt_u32, opt_u64},
};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_CHAT_MODEL: &str = "llama3.2";
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. [`DEFAULT_OLLAMA_URL`]
///
/// # Errors
///
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
pub fn ollama_endpoint_from(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<String, AiLlmError> {
    if let Some(url) = non_empty(lookup, "OLLAMA_URL") {
        return Ok(url);
    }
    if let Some(port) = non_empty(lookup, "OLLAMA_PORT") {
        let _ = port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Ok(DEFAULT_OLLAMA_URL.to_string())
}

/// Constructs the **chat** profile.
///
/// # Defaults
/// - `temperature = Some(0.2)`
/// - `timeout_secs = Some(600)`
pub fn config_ollama_chat_from(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<LlmModelConfig, AiLlmError> {
    let cfg = LlmModelConfig {
        model: non_empty(lookup, "OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.into()),
        endpoint: ollama_endpoint_from(lookup)?,
        max_tokens: opt_u32(lookup, "LLM_MAX_TOKENS")?,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(opt_u64(lookup, "LLM_TIMEOUT_SECS")?.unwrap_or(600)),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Constructs the **embedding** profile.
///
/// # Defaults
/// - no sampling options (`/api/embed` takes none)
/// - `timeout_secs = Some(120)`
pub fn config_ollama_embedding_from(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<LlmModelConfig, AiLlmError> {
    let cfg = LlmModelConfig {
        model: non_empty(lookup, "EMBEDDING_MODEL")
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.into()),
        endpoint: ollama_endpoint_from(lookup)?,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(opt_u64(lookup, "EMBEDDING_TIMEOUT_SECS")?.unwrap_or(120)),
    };
    cfg.validate()?;
    Ok(cfg)
}
