// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Request / Response Types
//!
//! The Coordinator's inherent API (spec §6): `write_document`,
//! `read_document`, `delete_document`. Plain data types rather than a
//! trait, since this is an in-process facade — the `bootstrap` CLI and any
//! future transport-level facade build these from their own inputs.

use std::collections::BTreeMap;
use std::pin::Pin;

use tokio::io::AsyncRead;

use polystore_domain::entities::{SagaStatus, StepOutcome};
use polystore_domain::value_objects::{DocumentId, SagaId};

/// A boxed, pinned byte stream handed to the streaming upload pipeline.
/// Boxed because the concrete reader (a file, an in-memory cursor, a test
/// double) varies by caller and the request type itself must stay a plain,
/// `Send` value.
pub type PayloadSource = Pin<Box<dyn AsyncRead + Send>>;

/// One embedding to be written alongside a document (spec §3 Vector Record).
#[derive(Debug, Clone)]
pub struct VectorInput {
    pub vector_id: String,
    pub embedding: Vec<f32>,
    pub metadata: BTreeMap<String, String>,
}

impl VectorInput {
    pub fn new(vector_id: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self { vector_id: vector_id.into(), embedding, metadata: BTreeMap::new() }
    }
}

/// One outgoing relation to another document (spec §3 Graph Relation).
#[derive(Debug, Clone)]
pub struct RelationInput {
    pub target: DocumentId,
    pub relation_type: String,
    pub strength: f32,
    pub confidence: f32,
    pub metadata: BTreeMap<String, String>,
}

impl RelationInput {
    pub fn new(target: DocumentId, relation_type: impl Into<String>, strength: f32, confidence: f32) -> Self {
        Self { target, relation_type: relation_type.into(), strength, confidence, metadata: BTreeMap::new() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Reused as the idempotency key passed to every adapter `put` (spec
    /// §4.1): retrying the exact same write request is then a safe no-op
    /// rather than a duplicate.
    pub idempotency_key: Option<String>,
}

/// A write request (spec §6): `write_document(document_id?, metadata,
/// payload_source?, vectors?, relations?, options) → SagaResult`.
pub struct WriteRequest {
    pub document_id: Option<DocumentId>,
    /// When set, resumes this saga id instead of minting a fresh one (spec
    /// §4.5: "re-running a crashed saga with the same saga id replays only
    /// those steps not marked completed"). Leave unset for an ordinary new
    /// write.
    pub saga_id: Option<SagaId>,
    pub original_file_reference: String,
    pub mime_type: String,
    pub metadata: serde_json::Value,
    pub payload_source: Option<PayloadSource>,
    pub vectors: Vec<VectorInput>,
    pub relations: Vec<RelationInput>,
    pub options: WriteOptions,
}

impl WriteRequest {
    pub fn new(original_file_reference: impl Into<String>, mime_type: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self {
            document_id: None,
            saga_id: None,
            original_file_reference: original_file_reference.into(),
            mime_type: mime_type.into(),
            metadata,
            payload_source: None,
            vectors: Vec::new(),
            relations: Vec::new(),
            options: WriteOptions::default(),
        }
    }

    pub fn with_document_id(mut self, document_id: DocumentId) -> Self {
        self.document_id = Some(document_id);
        self
    }

    /// Marks this request as a resume of a previously started (and
    /// presumably crashed) saga rather than a fresh write.
    pub fn resuming(mut self, saga_id: SagaId) -> Self {
        self.saga_id = Some(saga_id);
        self
    }

    pub fn with_payload(mut self, source: impl AsyncRead + Send + 'static) -> Self {
        self.payload_source = Some(Box::pin(source));
        self
    }

    pub fn with_vector(mut self, vector: VectorInput) -> Self {
        self.vectors.push(vector);
        self
    }

    pub fn with_relation(mut self, relation: RelationInput) -> Self {
        self.relations.push(relation);
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Skips the cache lookup, forcing a fresh backend fan-out (still
    /// repopulates the cache with the result).
    pub bypass_cache: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteOptions {}

/// The terminal outcome of a saga (spec §6): "final status and, on
/// failure, the ordered list of step outcomes."
#[derive(Debug, Clone)]
pub struct SagaResult {
    pub saga_id: SagaId,
    pub document_id: DocumentId,
    pub status: SagaStatus,
    pub steps: Vec<StepOutcome>,
}

impl SagaResult {
    pub fn is_success(&self) -> bool {
        self.status == SagaStatus::Completed
    }
}
