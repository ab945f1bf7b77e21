use crate::error_handler::{ConfigError, Result, validate_http_endpoint, validate_range_f32};

/// Configuration for one Ollama model profile.
///
/// # Fields
///
/// - `model`: The model identifier (e.g., `"llama3.2"`, `"nomic-embed-text"`).
/// - `endpoint`: The Ollama base URL (e.g., `"http://localhost:11434"`).
/// - `max_tokens`: Maximum number of tokens to generate (chat only).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::LlmModelConfig;
///
/// let cfg = LlmModelConfig {
///     model: "llama3.2".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     max_tokens: Some(1024),
///     temperature: Some(0.2),
///     top_p: None,
///     timeout_secs: Some(600),
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// Model identifier string.
    pub model: String,

    /// Ollama base URL.
    pub endpoint: String,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature (controls creativity).
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Same profile pointed at another model (CLI `-a`/`-e`/`-m` overrides).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Checks endpoint scheme, model name and sampling ranges.
    pub fn validate(&self) -> Result<()> {
        validate_http_endpoint("OLLAMA_URL", &self.endpoint)?;
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            model: "llama3.2".into(),
            endpoint: "http://localhost:11434".into(),
            max_tokens: None,
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(30),
        }
    }

    #[test]
    fn rejects_empty_model_and_bad_temperature() {
        assert!(cfg().with_model(" ").validate().is_err());
        let mut hot = cfg();
        hot.temperature = Some(3.5);
        assert!(hot.validate().is_err());
        assert!(cfg().validate().is_ok());
    }
}
