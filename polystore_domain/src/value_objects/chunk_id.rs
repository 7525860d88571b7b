// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Deterministic chunk identity, derived from `(document_id, ordinal)` per
//! spec §4.2 so idempotency keys can be reconstructed without a lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_objects::DocumentId;

/// `document_id:ordinal`, also used verbatim as the idempotency key for a
/// chunk's upload (spec §4.4 step 2).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkId(String);

impl ChunkId {
    pub fn new(document_id: &DocumentId, ordinal: u64) -> Self {
        Self(format!("{document_id}:{ordinal}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
