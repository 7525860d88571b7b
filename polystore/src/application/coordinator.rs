// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Coordinator
//!
//! The single entry point for `write_document`, `read_document`, and
//! `delete_document` (spec §6). Wires the four reference adapters, the
//! read-side cache, the saga engine, and the metrics service together;
//! everything below this is plumbing the `bootstrap` CLI never touches
//! directly.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use polystore_domain::entities::{all_same_dimension, Document, GraphRelation, ProcessingStatus, VectorRecord};
use polystore_domain::error::CoordinatorError;
use polystore_domain::repositories::SagaLog;
use polystore_domain::services::{Adapter, Cache, StreamingAdapter};
use polystore_domain::value_objects::{ContentHash, DocumentId};

use crate::infrastructure::adapters::{FilesystemDocumentAdapter, InMemoryGraphAdapter, InMemoryVectorAdapter, SqliteRelationalAdapter};
use crate::infrastructure::cache::{run_sweeper, DocumentCache};
use crate::infrastructure::config::{CoordinatorConfig, RetryPolicy};
use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::runtime::CancellationToken;
use crate::infrastructure::saga::builders::{delete_step, graph_write, integrity_gate, metadata_write, payload_stream, vector_write};
use crate::infrastructure::saga::{InMemorySagaLog, NdjsonSagaLog, SagaDefinition, SagaEngine};
use crate::infrastructure::streaming::{spawn_chunk_producer, upload_chunks};

use super::requests::{DeleteOptions, ReadOptions, SagaResult, WriteRequest};

/// The relational backend's payload: the `Document` aggregate paired with
/// the caller's free-form metadata, since `Document` itself has no field
/// for arbitrary key/value metadata (spec §3).
#[derive(Debug, Serialize, Deserialize)]
struct DocumentEnvelope {
    document: Document,
    metadata: serde_json::Value,
}

pub struct Coordinator {
    config: CoordinatorConfig,
    relational: Arc<SqliteRelationalAdapter>,
    document: Arc<FilesystemDocumentAdapter>,
    vector: Arc<InMemoryVectorAdapter>,
    graph: Arc<InMemoryGraphAdapter>,
    cache: Arc<DocumentCache>,
    engine: Arc<SagaEngine>,
    metrics: Arc<MetricsService>,
    cancellation: CancellationToken,
    sweeper: JoinHandle<()>,
}

impl Coordinator {
    pub fn new(
        config: CoordinatorConfig,
        relational: Arc<SqliteRelationalAdapter>,
        document: Arc<FilesystemDocumentAdapter>,
        vector: Arc<InMemoryVectorAdapter>,
        graph: Arc<InMemoryGraphAdapter>,
    ) -> Result<Self, CoordinatorError> {
        let metrics = Arc::new(MetricsService::new(&config.metrics.namespace)?);
        let cache = Arc::new(DocumentCache::new(config.cache.max_size, config.cache.default_ttl_seconds));

        let saga_log: Arc<dyn SagaLog> = match &config.saga.durable_log_path {
            Some(path) => Arc::new(NdjsonSagaLog::new(path.clone())),
            None => Arc::new(InMemorySagaLog::new()),
        };
        let engine = Arc::new(SagaEngine::new(saga_log, metrics.clone(), config.saga.clone()));

        let cancellation = CancellationToken::new();
        let sweeper = {
            let cache = cache.clone();
            let interval = Duration::from_secs(config.cache.auto_cleanup_interval_seconds.max(1));
            let cancellation = cancellation.clone();
            tokio::spawn(run_sweeper(cache, interval, cancellation))
        };

        Ok(Self { config, relational, document, vector, graph, cache, engine, metrics, cancellation, sweeper })
    }

    /// Stops the background cache sweeper. Does not wait for in-flight
    /// sagas — callers drain those themselves before calling this.
    pub fn shutdown(&self) {
        self.cancellation.cancel();
        self.sweeper.abort();
    }

    fn streaming_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.config.streaming.max_attempts_per_chunk,
            initial_delay_seconds: self.config.streaming.backoff_initial_seconds,
            multiplier: self.config.streaming.backoff_multiplier,
            jitter_fraction: self.config.saga.step_retry_policy.jitter_fraction,
        }
    }

    /// Writes a document's metadata, payload, embeddings, and relations as
    /// one saga (spec §4.5, §6). The payload (if present) is fully uploaded,
    /// chunk by chunk with its own retry budget, before the saga itself
    /// starts — the saga only records and verifies the resulting manifest.
    pub async fn write_document(&self, request: WriteRequest) -> Result<SagaResult, CoordinatorError> {
        let document_id = request.document_id.unwrap_or_default();
        let retry_policy = self.config.saga.step_retry_policy.clone();

        let (content_hash, size_bytes, stream_plan) = match request.payload_source {
            Some(source) => {
                let (rx, producer) = spawn_chunk_producer(source, self.config.streaming.chunk_size_bytes);
                let streaming_adapter: Arc<dyn StreamingAdapter> = self.document.clone();
                let native_keys = upload_chunks(streaming_adapter, rx, document_id, self.streaming_retry_policy(), self.cancellation.clone())
                    .await
                    .map_err(|e| CoordinatorError::AdapterFailed { kind: e.kind, message: e.message })?;
                let summary = producer
                    .await
                    .map_err(|e| CoordinatorError::internal(format!("chunk producer task panicked: {e}")))?
                    .map_err(CoordinatorError::from)?;

                (summary.aggregate_hash.clone(), summary.total_size, Some((native_keys, summary)))
            }
            None => (ContentHash::of(b""), 0, None),
        };

        let now = chrono::Utc::now();
        let document = Document {
            document_id,
            original_file_reference: request.original_file_reference,
            content_hash,
            size_bytes,
            mime_type: request.mime_type,
            created_at: now,
            updated_at: now,
            status: ProcessingStatus::Pending,
            references: Default::default(),
        };

        let vector_records = request
            .vectors
            .into_iter()
            .map(|v| {
                let mut record = VectorRecord::new(document_id, v.vector_id, v.embedding)?;
                record.metadata = v.metadata;
                Ok(record)
            })
            .collect::<Result<Vec<_>, CoordinatorError>>()?;
        if !all_same_dimension(&vector_records) {
            return Err(CoordinatorError::invalid_document("vector records in one write must share the same embedding dimension"));
        }

        let relations = request
            .relations
            .into_iter()
            .map(|r| {
                let mut relation = GraphRelation::new(document_id, r.target, r.relation_type, r.strength, r.confidence)?;
                relation.metadata = r.metadata;
                Ok(relation)
            })
            .collect::<Result<Vec<_>, CoordinatorError>>()?;

        let relational_adapter: Arc<dyn Adapter> = self.relational.clone();
        let document_adapter: Arc<dyn Adapter> = self.document.clone();
        let vector_adapter: Arc<dyn Adapter> = self.vector.clone();
        let graph_adapter: Arc<dyn Adapter> = self.graph.clone();

        let envelope = DocumentEnvelope { document, metadata: request.metadata };
        let relational_payload = serde_json::to_vec(&envelope)?;

        let mut definition = SagaDefinition::new().then(metadata_write(relational_adapter, relational_payload, retry_policy.clone()));

        if let Some((native_keys, summary)) = stream_plan {
            let expected_hash = summary.aggregate_hash.to_string();
            let expected_size = summary.total_size;
            let streaming_adapter: Arc<dyn StreamingAdapter> = self.document.clone();
            definition = definition
                .then(payload_stream(document_adapter, native_keys, summary))
                .then(integrity_gate(streaming_adapter, expected_hash, expected_size));
        }

        if !vector_records.is_empty() {
            let payload = serde_json::to_vec(&vector_records)?;
            definition = definition.then(vector_write(vector_adapter, payload, retry_policy.clone()));
        }

        if !relations.is_empty() {
            let payload = serde_json::to_vec(&relations)?;
            definition = definition.then(graph_write(graph_adapter, payload, retry_policy));
        }

        let record = match request.saga_id {
            Some(saga_id) => self.engine.resume(saga_id, document_id, definition, self.cancellation.clone()).await?,
            None => self.engine.run(document_id, definition, self.cancellation.clone()).await?,
        };

        if record.status == polystore_domain::entities::SagaStatus::Completed {
            self.cache.invalidate(&document_id);
        }

        Ok(SagaResult { saga_id: record.saga_id, document_id, status: record.status, steps: record.steps })
    }

    /// Reads the materialized view for a document (spec §6): a cache hit, or
    /// a fan-out across the relational/vector/graph adapters that
    /// repopulates the cache before returning.
    pub async fn read_document(&self, document_id: DocumentId, options: ReadOptions) -> Result<Option<polystore_domain::entities::MaterializedView>, CoordinatorError> {
        if !options.bypass_cache {
            if let Some(view) = self.cache.get(&document_id) {
                self.metrics.record_cache_hit();
                return Ok(Some(view.marked_cached()));
            }
            self.metrics.record_cache_miss();
        }

        let Some(relational_bytes) = self.relational.get(&document_id).await.map_err(adapter_to_coordinator_error)? else {
            return Ok(None);
        };
        let envelope: DocumentEnvelope = serde_json::from_slice(&relational_bytes)?;

        let vectors = match self.vector.get(&document_id).await.map_err(adapter_to_coordinator_error)? {
            Some(bytes) => serde_json::from_slice::<Vec<VectorRecord>>(&bytes)?,
            None => Vec::new(),
        };

        let relations = match self.graph.get(&document_id).await.map_err(adapter_to_coordinator_error)? {
            Some(bytes) => serde_json::from_slice::<Vec<GraphRelation>>(&bytes)?,
            None => Vec::new(),
        };

        let view = polystore_domain::entities::MaterializedView::from_document(envelope.document).with_vectors(vectors).with_relations(relations);
        self.cache.put(document_id, view.clone());

        Ok(Some(view))
    }

    /// Deletes a document from every backend (spec §4.1, §6): modeled as a
    /// best-effort fan-out of idempotent deletes rather than a
    /// forward/compensate saga, since there is nothing to compensate a
    /// delete with.
    pub async fn delete_document(&self, document_id: DocumentId, _options: DeleteOptions) -> Result<SagaResult, CoordinatorError> {
        let definition = SagaDefinition::new()
            .then(delete_step("MetadataDelete", self.relational.clone()))
            .then(delete_step("DocumentDelete", self.document.clone()))
            .then(delete_step("VectorDelete", self.vector.clone()))
            .then(delete_step("GraphDelete", self.graph.clone()));

        let record = self.engine.run(document_id, definition, self.cancellation.clone()).await?;
        self.cache.invalidate(&document_id);

        Ok(SagaResult { saga_id: record.saga_id, document_id, status: record.status, steps: record.steps })
    }
}

fn adapter_to_coordinator_error(err: polystore_domain::error::AdapterError) -> CoordinatorError {
    CoordinatorError::AdapterFailed { kind: err.kind, message: err.message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::requests::{RelationInput, VectorInput};
    use polystore_domain::entities::SagaStatus;
    use std::io::Cursor;

    async fn coordinator() -> Coordinator {
        let config = CoordinatorConfig::default();
        let relational = Arc::new(SqliteRelationalAdapter::in_memory().await.unwrap());
        let dir = tempfile::tempdir().unwrap();
        let document = Arc::new(FilesystemDocumentAdapter::new(dir.path().to_path_buf()));
        std::mem::forget(dir);
        let vector = Arc::new(InMemoryVectorAdapter::new());
        let graph = Arc::new(InMemoryGraphAdapter::new());
        Coordinator::new(config, relational, document, vector, graph).unwrap()
    }

    #[tokio::test]
    async fn a_write_then_read_round_trips_metadata_payload_vectors_and_relations() {
        let coordinator = coordinator().await;
        let target = DocumentId::new();

        let request = WriteRequest::new("s3://bucket/key", "text/plain", serde_json::json!({"title": "X"}))
            .with_payload(Cursor::new(b"hello world".to_vec()))
            .with_vector(VectorInput::new("v1", vec![0.1, 0.2]))
            .with_relation(RelationInput::new(target, "cites", 0.5, 0.9));

        let result = coordinator.write_document(request).await.unwrap();
        assert_eq!(result.status, SagaStatus::Completed);

        let view = coordinator.read_document(result.document_id, ReadOptions::default()).await.unwrap().unwrap();
        assert_eq!(view.document.original_file_reference, "s3://bucket/key");
        assert_eq!(view.vectors.len(), 1);
        assert_eq!(view.relations.len(), 1);
    }

    #[tokio::test]
    async fn reading_an_unknown_document_returns_none() {
        let coordinator = coordinator().await;
        assert!(coordinator.read_document(DocumentId::new(), ReadOptions::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn a_second_read_is_served_from_cache() {
        let coordinator = coordinator().await;
        let request = WriteRequest::new("ref", "text/plain", serde_json::json!({}));
        let result = coordinator.write_document(request).await.unwrap();

        let first = coordinator.read_document(result.document_id, ReadOptions::default()).await.unwrap().unwrap();
        assert!(!first.cached);
        let second = coordinator.read_document(result.document_id, ReadOptions::default()).await.unwrap().unwrap();
        assert!(second.cached);
    }

    #[tokio::test]
    async fn deleting_a_document_removes_it_from_every_backend() {
        let coordinator = coordinator().await;
        let request = WriteRequest::new("ref", "text/plain", serde_json::json!({})).with_vector(VectorInput::new("v1", vec![0.1]));
        let result = coordinator.write_document(request).await.unwrap();

        let delete_result = coordinator.delete_document(result.document_id, DeleteOptions::default()).await.unwrap();
        assert_eq!(delete_result.status, SagaStatus::Completed);
        assert!(coordinator.read_document(result.document_id, ReadOptions { bypass_cache: true }).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mismatched_vector_dimensions_are_rejected_before_the_saga_runs() {
        let coordinator = coordinator().await;
        let request = WriteRequest::new("ref", "text/plain", serde_json::json!({}))
            .with_vector(VectorInput::new("v1", vec![0.1, 0.2]))
            .with_vector(VectorInput::new("v2", vec![0.1, 0.2, 0.3]));

        assert!(coordinator.write_document(request).await.is_err());
    }
}
