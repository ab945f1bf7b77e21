//! Shared Ollama service for the RAG workspace.
//!
//! Two logical profiles are used by the pipelines:
//! - **embedding** → `POST /api/embed` with a batch of inputs
//! - **chat**      → `POST /api/chat` with a single-turn conversation
//!
//! Construct [`service_profiles::LlmServiceProfiles`] once, wrap it in `Arc`
//! and hand clones to the adapters in `rag-base` and `contextor`.

pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use error_handler::{AiLlmError, ConfigError, Result};
pub use service_profiles::LlmServiceProfiles;
pub use services::ollama_service::{ChatMessage, OllamaService};
