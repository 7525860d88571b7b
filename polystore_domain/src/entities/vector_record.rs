// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Vector Record Entity
//!
//! One per semantic unit of a document (spec §3). Storage only: ranking and
//! similarity search are explicitly delegated to the vector store itself
//! (spec §1 Non-goals).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoordinatorError;
use crate::value_objects::DocumentId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub document_id: DocumentId,
    pub vector_id: String,
    pub embedding: Vec<f32>,
    pub metadata: BTreeMap<String, String>,
}

impl VectorRecord {
    pub fn new(document_id: DocumentId, vector_id: impl Into<String>, embedding: Vec<f32>) -> Result<Self, CoordinatorError> {
        if embedding.is_empty() {
            return Err(CoordinatorError::InvalidDocument("vector record embedding must not be empty".into()));
        }
        Ok(Self { document_id, vector_id: vector_id.into(), embedding, metadata: BTreeMap::new() })
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Every vector record's dimension must agree within one saga's batch, so a
/// single write plan doesn't silently mix embedding spaces (spec §3).
pub fn all_same_dimension(records: &[VectorRecord]) -> bool {
    match records.first() {
        None => true,
        Some(first) => records.iter().all(|r| r.dimension() == first.dimension()),
    }
}
