//! Core data models used by the library.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Payload key holding the chunk text.
pub const DOCUMENT_KEY: &str = "document";

/// Canonical record stored in a collection.
///
/// `id` is `{source file name}_{ordinal}`; backends derive their native point id
/// from it, so re-inserting the same id replaces the earlier record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: String,
    pub document: String,
    /// Non-empty values only (source path, page number, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub embedding: Vec<f32>,
}

impl StoreRecord {
    /// Flat JSON payload: `{ "id", "document", ...metadata }`.
    pub fn payload_json(&self) -> serde_json::Value {
        let mut m = serde_json::Map::new();
        for (k, v) in &self.metadata {
            m.insert(k.clone(), serde_json::Value::String(v.clone()));
        }
        m.insert("id".into(), serde_json::Value::String(self.id.clone()));
        m.insert(
            DOCUMENT_KEY.into(),
            serde_json::Value::String(self.document.clone()),
        );
        serde_json::Value::Object(m)
    }
}

/// What to do when the target collection already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    /// Stop before any embedding work.
    #[default]
    AbortIfExists,
    /// Delete and recreate the collection.
    Overwrite,
    /// Keep the collection and upsert records by id.
    Merge,
}

/// How `prepare_collection` left the collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrepareOutcome {
    Created,
    Recreated,
    Reused,
}

/// Summary of a batched insert.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub collection: String,
    /// Number of batches sent.
    pub batches: usize,
    /// Records acknowledged by the store.
    pub inserted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_document_and_metadata() {
        let rec = StoreRecord {
            id: "rules.md_0".into(),
            document: "Mechs have HP.".into(),
            metadata: BTreeMap::from([("source".to_string(), "data/rules.md".to_string())]),
            embedding: vec![0.1, 0.2],
        };
        let p = rec.payload_json();
        assert_eq!(p["id"], "rules.md_0");
        assert_eq!(p[DOCUMENT_KEY], "Mechs have HP.");
        assert_eq!(p["source"], "data/rules.md");
    }

    #[test]
    fn policy_defaults_to_abort() {
        assert_eq!(OverwritePolicy::default(), OverwritePolicy::AbortIfExists);
    }
}
