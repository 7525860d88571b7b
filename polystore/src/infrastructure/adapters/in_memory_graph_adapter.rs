// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Graph Adapter
//!
//! Reference implementation of the relations ("graph") backend (spec
//! §4.1). The relation set is an arena of edge records keyed by their
//! canonical [`RelationId`] hash (spec §9) rather than a graph of owning
//! pointers, so [`InMemoryGraphAdapter::reachable`] can use the domain's
//! explicit visited-set traversal without risking unbounded recursion on a
//! cycle. `put` replaces the full set of relations sourced from one
//! document id; duplicate triples collapse by construction since
//! [`RelationId`] is a canonical hash of `(source, target, type)`.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use polystore_domain::entities::{is_reachable, BackendKind, GraphRelation};
use polystore_domain::error::AdapterError;
use polystore_domain::services::{Adapter, Health, PutOptions, PutOutcome};
use polystore_domain::value_objects::{DocumentId, RelationId};

#[derive(Default)]
pub struct InMemoryGraphAdapter {
    by_document: Mutex<HashMap<DocumentId, HashMap<RelationId, GraphRelation>>>,
}

impl InMemoryGraphAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All relations currently stored, across every document, for use in
    /// traversal queries.
    pub fn all_relations(&self) -> Vec<GraphRelation> {
        self.by_document.lock().values().flat_map(|m| m.values().cloned()).collect()
    }

    pub fn reachable(&self, start: &DocumentId, target: &DocumentId) -> bool {
        let edges = self.all_relations();
        is_reachable(&edges, start, target)
    }
}

#[async_trait]
impl Adapter for InMemoryGraphAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Graph
    }

    async fn put(&self, document_id: &DocumentId, payload: &[u8], _options: PutOptions) -> Result<PutOutcome, AdapterError> {
        let relations: Vec<GraphRelation> = serde_json::from_slice(payload)
            .map_err(|e| AdapterError::permanent(format!("invalid relation payload: {e}")))?;

        if relations.iter().any(|r| r.source != *document_id) {
            return Err(AdapterError::permanent("all relations in a single put must share the put's document_id as source"));
        }

        let mut by_relation_id = HashMap::new();
        for relation in relations {
            by_relation_id.insert(relation.relation_id.clone(), relation);
        }

        self.by_document.lock().insert(*document_id, by_relation_id);
        Ok(PutOutcome { native_key: document_id.to_string() })
    }

    async fn get(&self, document_id: &DocumentId) -> Result<Option<Vec<u8>>, AdapterError> {
        let guard = self.by_document.lock();
        match guard.get(document_id) {
            None => Ok(None),
            Some(relations) => {
                let list: Vec<&GraphRelation> = relations.values().collect();
                serde_json::to_vec(&list).map(Some).map_err(|e| AdapterError::permanent(format!("failed to serialize relations: {e}")))
            }
        }
    }

    async fn delete(&self, document_id: &DocumentId, _native_key: &str) -> Result<bool, AdapterError> {
        Ok(self.by_document.lock().remove(document_id).is_some())
    }

    async fn health(&self) -> Health {
        Health::reachable()
    }
}
