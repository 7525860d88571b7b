// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Materialized View
//!
//! The read-side representation returned by `read_document` (spec §6): a
//! fan-out across the four adapters, or a cache hit. Carries a `cached` flag
//! so callers (and tests, per scenario S1) can observe whether a read was
//! served from the cache.

use serde::{Deserialize, Serialize};

use crate::entities::{Document, GraphRelation, VectorRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializedView {
    pub document: Document,
    pub vectors: Vec<VectorRecord>,
    pub relations: Vec<GraphRelation>,
    pub cached: bool,
}

impl MaterializedView {
    pub fn from_document(document: Document) -> Self {
        Self { document, vectors: Vec::new(), relations: Vec::new(), cached: false }
    }

    pub fn with_vectors(mut self, vectors: Vec<VectorRecord>) -> Self {
        self.vectors = vectors;
        self
    }

    pub fn with_relations(mut self, relations: Vec<GraphRelation>) -> Self {
        self.relations = relations;
        self
    }

    pub fn marked_cached(mut self) -> Self {
        self.cached = true;
        self
    }

    /// Rough byte-size estimate used for the cache's `max_bytes` budget
    /// (spec §4.3); precise accounting is not required by the contract.
    pub fn estimated_size_bytes(&self) -> usize {
        let base = std::mem::size_of::<Document>() + self.document.original_file_reference.len() + self.document.mime_type.len();
        let vectors: usize = self.vectors.iter().map(|v| v.embedding.len() * std::mem::size_of::<f32>() + v.vector_id.len()).sum();
        let relations = self.relations.len() * std::mem::size_of::<GraphRelation>();
        base + vectors + relations
    }
}
