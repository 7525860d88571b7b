// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Canonical, content-derived relation identity (spec §4.2): a hash of
//! `(source, target, type)` so "at most one edge exists" (spec §3) can be
//! enforced by identity rather than a separate uniqueness query.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::value_objects::DocumentId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationId(String);

impl RelationId {
    pub fn new(source: &DocumentId, target: &DocumentId, relation_type: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(target.to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(relation_type.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_id_is_canonical_per_triple() {
        let a = DocumentId::new();
        let b = DocumentId::new();
        let id1 = RelationId::new(&a, &b, "cites");
        let id2 = RelationId::new(&a, &b, "cites");
        let id3 = RelationId::new(&a, &b, "references");
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn relation_id_is_directional() {
        let a = DocumentId::new();
        let b = DocumentId::new();
        assert_ne!(RelationId::new(&a, &b, "cites"), RelationId::new(&b, &a, "cites"));
    }
}
