//! Runtime and collection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use services::retry::RetryPolicy;

use crate::errors::StoreError;

/// Default number of records per insert request.
pub const DEFAULT_INSERT_BATCH: usize = 1000;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DistanceKind {
    /// Cosine distance (used for every collection this tool creates).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

impl DistanceKind {
    /// Parse from env string (case-insensitive). Defaults to Cosine.
    pub fn parse_or_cosine(s: Option<&str>) -> Self {
        match s.unwrap_or("cosine").trim().to_lowercase().as_str() {
            "dot" | "dotproduct" => DistanceKind::Dot,
            "euclid" | "l2" => DistanceKind::Euclid,
            _ => DistanceKind::Cosine,
        }
    }
}

/// Describes the vector space of the collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorSpace {
    /// Dimensionality of vectors.
    pub size: usize,
    /// Distance function.
    pub distance: DistanceKind,
}

/// Configuration for the vector store.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Distance function for new collections.
    pub distance: DistanceKind,
    /// Records per insert request.
    pub insert_batch: usize,
    /// Per-call deadline and retry knobs.
    pub retry: RetryPolicy,
}

impl StoreConfig {
    /// Creates a sane default config for a Qdrant endpoint.
    pub fn new_default(url: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            distance: DistanceKind::Cosine,
            insert_batch: DEFAULT_INSERT_BATCH,
            retry: RetryPolicy::default().with_timeout(Duration::from_secs(30)),
        }
    }

    /// Reads the config through `lookup`.
    ///
    /// Variables: `QDRANT_URL` (default `http://localhost:6334`), `QDRANT_API_KEY`,
    /// `QDRANT_DISTANCE`, `INSERT_BATCH_SIZE` (default 1000), `QDRANT_TIMEOUT_SECS`
    /// (default 30), `RETRY_MAX`, `RETRY_BACKOFF_MS`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut cfg = Self::new_default(
            get("QDRANT_URL").unwrap_or_else(|| "http://localhost:6334".to_string()),
        );
        cfg.qdrant_api_key = get("QDRANT_API_KEY");
        cfg.distance = DistanceKind::parse_or_cosine(get("QDRANT_DISTANCE").as_deref());
        if let Some(v) = get("INSERT_BATCH_SIZE") {
            cfg.insert_batch = v
                .parse()
                .map_err(|_| StoreError::Config(format!("INSERT_BATCH_SIZE = '{v}'")))?;
        }
        let timeout = match get("QDRANT_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|_| StoreError::Config(format!("QDRANT_TIMEOUT_SECS = '{v}'")))?,
            None => 30,
        };
        cfg.retry = RetryPolicy::from_lookup(&lookup).with_timeout(Duration::from_secs(timeout));
        cfg.validate()?;
        Ok(cfg)
    }

    /// [`StoreConfig::from_lookup`] over the process environment.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), StoreError> {
        let url = self.qdrant_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StoreError::Config(
                "qdrant_url must start with http:// or https://".into(),
            ));
        }
        if self.insert_batch == 0 {
            return Err(StoreError::Config("insert_batch must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let cfg = StoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.insert_batch, 1000);
        assert_eq!(cfg.distance, DistanceKind::Cosine);
        assert_eq!(cfg.retry.timeout, Duration::from_secs(30));

        let cfg = StoreConfig::from_lookup(|k| match k {
            "INSERT_BATCH_SIZE" => Some("250".into()),
            "QDRANT_TIMEOUT_SECS" => Some("5".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.insert_batch, 250);
        assert_eq!(cfg.retry.timeout, Duration::from_secs(5));
    }

    #[test]
    fn zero_batch_rejected() {
        let res = StoreConfig::from_lookup(|k| (k == "INSERT_BATCH_SIZE").then(|| "0".into()));
        assert!(matches!(res, Err(StoreError::Config(_))));
    }
}
