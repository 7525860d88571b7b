// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Vector Adapter
//!
//! Reference implementation of the embeddings ("vector") backend (spec
//! §4.1). Similarity search is explicitly delegated to the vector store
//! itself (spec §1 Non-goals) — this adapter only stores and retrieves the
//! serialized `VectorRecord` batch for a document.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use polystore_domain::entities::BackendKind;
use polystore_domain::error::AdapterError;
use polystore_domain::services::{Adapter, Health, PutOptions, PutOutcome};
use polystore_domain::value_objects::DocumentId;

#[derive(Default)]
pub struct InMemoryVectorAdapter {
    store: Mutex<HashMap<DocumentId, Vec<u8>>>,
}

impl InMemoryVectorAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Adapter for InMemoryVectorAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Vector
    }

    async fn put(&self, document_id: &DocumentId, payload: &[u8], _options: PutOptions) -> Result<PutOutcome, AdapterError> {
        self.store.lock().insert(*document_id, payload.to_vec());
        Ok(PutOutcome { native_key: document_id.to_string() })
    }

    async fn get(&self, document_id: &DocumentId) -> Result<Option<Vec<u8>>, AdapterError> {
        Ok(self.store.lock().get(document_id).cloned())
    }

    async fn delete(&self, document_id: &DocumentId, _native_key: &str) -> Result<bool, AdapterError> {
        Ok(self.store.lock().remove(document_id).is_some())
    }

    async fn health(&self) -> Health {
        Health::reachable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let adapter = InMemoryVectorAdapter::new();
        let id = DocumentId::new();
        adapter.put(&id, b"[0.1,0.2]", PutOptions::default()).await.unwrap();
        assert_eq!(adapter.get(&id).await.unwrap(), Some(b"[0.1,0.2]".to_vec()));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let adapter = InMemoryVectorAdapter::new();
        let id = DocumentId::new();
        adapter.put(&id, b"x", PutOptions::default()).await.unwrap();
        assert!(adapter.delete(&id, "").await.unwrap());
        assert!(!adapter.delete(&id, "").await.unwrap());
    }
}
