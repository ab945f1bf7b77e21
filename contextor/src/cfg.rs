//! Runtime configuration loaded from environment variables.

use crate::error::ContextorError;

/// Default number of documents retrieved per query.
pub const DEFAULT_TOP_K: usize = 15;
/// Default topic named in the prompt.
pub const DEFAULT_SUBJECT: &str = r#"the Tabletop Role Playing Game "Lancer""#;

/// Defaults for the query pipeline; CLI flags override them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryConfig {
    /// Documents retrieved per query (`RAG_TOP_K`).
    pub top_k: usize,
    /// What the documents are about (`RAG_SUBJECT`).
    pub subject: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }
}

impl QueryConfig {
    /// Reads overrides through `lookup`.
    ///
    /// # Errors
    /// [`ContextorError::InvalidQuery`] if `RAG_TOP_K` is not a positive integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ContextorError> {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = Self::default();

        if let Some(v) = get("RAG_TOP_K") {
            cfg.top_k = v
                .parse()
                .ok()
                .filter(|k: &usize| *k > 0)
                .ok_or_else(|| ContextorError::InvalidQuery(format!("RAG_TOP_K = '{v}'")))?;
        }
        if let Some(v) = get("RAG_SUBJECT") {
            cfg.subject = v;
        }
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self, ContextorError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }
}
