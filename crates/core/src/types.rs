//! Identifier types shared by every node in the content tree.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix used when a temporary id is rendered as a key string.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Where a node identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Minted client-side for a node the server has not stored yet.
    Temporary,
    /// Issued by the server.
    Persisted,
}

/// Stable identity of a section or lecture.
///
/// Ids never change on reorder or edit. Temporary ids are swapped for
/// persisted ones only after a successful save (see
/// [`apply_id_mapping`](crate::persistence::apply_id_mapping)).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    provenance: Provenance,
    value: String,
}

impl NodeId {
    /// Mint a fresh temporary id.
    pub fn temporary() -> Self {
        Self::temporary_with(Uuid::new_v4().to_string())
    }

    /// Temporary id with a caller-chosen value (used when a draft document
    /// already carries client ids).
    pub fn temporary_with(value: impl Into<String>) -> Self {
        Self {
            provenance: Provenance::Temporary,
            value: value.into(),
        }
    }

    /// Id issued by the server.
    pub fn persisted(value: impl Into<String>) -> Self {
        Self {
            provenance: Provenance::Persisted,
            value: value.into(),
        }
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn is_temporary(&self) -> bool {
        self.provenance == Provenance::Temporary
    }

    /// Raw value without any rendering prefix.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Key string for the rendering and drag-and-drop layers.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.provenance {
            Provenance::Temporary => write!(f, "{TEMP_ID_PREFIX}{}", self.value),
            Provenance::Persisted => f.write_str(&self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_ids_are_unique() {
        let a = NodeId::temporary();
        let b = NodeId::temporary();
        assert_ne!(a, b);
        assert!(a.is_temporary());
    }

    #[test]
    fn temporary_key_carries_prefix() {
        let id = NodeId::temporary_with("abc");
        assert_eq!(id.key(), "temp-abc");
        assert_eq!(id.value(), "abc");
    }

    #[test]
    fn persisted_key_is_raw_value() {
        let id = NodeId::persisted("64f1c2");
        assert_eq!(id.key(), "64f1c2");
        assert_eq!(id.provenance(), Provenance::Persisted);
    }

    #[test]
    fn same_value_different_provenance_are_distinct() {
        assert_ne!(NodeId::temporary_with("x"), NodeId::persisted("x"));
    }
}
