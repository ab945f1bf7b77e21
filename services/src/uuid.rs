// helpers.rs
use uuid::Uuid;

/// Deterministic UUIDv5 from an arbitrary record id.
///
/// Vector stores that only accept UUID/integer ids (Qdrant) get the same point
/// id for the same `{filename}_{ordinal}` on every run.
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_same_uuid() {
        assert_eq!(stable_uuid("rules.md_0"), stable_uuid("rules.md_0"));
        assert_ne!(stable_uuid("rules.md_0"), stable_uuid("rules.md_1"));
    }
}
