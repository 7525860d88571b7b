// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Drives the saga engine directly against fault-injecting adapters to
//! exercise paths the happy-path reference adapters never take: a rolled
//! back integrity failure, a transient error that resolves within the
//! retry budget, and a compensation that itself fails.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use polystore::infrastructure::config::RetryPolicy;
use polystore::infrastructure::metrics::MetricsService;
use polystore::infrastructure::runtime::CancellationToken;
use polystore::infrastructure::saga::builders::{graph_write, integrity_gate, metadata_write, payload_stream, vector_write};
use polystore::infrastructure::saga::{InMemorySagaLog, SagaDefinition, SagaEngine};
use polystore::infrastructure::CoordinatorConfig;
use polystore_domain::entities::{BackendKind, SagaStatus, StepStatus};
use polystore_domain::error::AdapterError;
use polystore_domain::services::{Adapter, Health, PutOptions, PutOutcome, StreamChunk, StreamingAdapter};
use polystore_domain::value_objects::{ContentHash, DocumentId};

/// An in-memory adapter whose `put` fails with a caller-chosen error kind
/// for its first `fail_times` calls, then succeeds; `delete` can likewise
/// be forced to always fail, to exercise a failing compensation.
struct FlakyAdapter {
    kind: BackendKind,
    store: Mutex<HashMap<DocumentId, Vec<u8>>>,
    put_failures_remaining: AtomicU32,
    fail_kind: Mutex<Option<AdapterError>>,
    delete_always_fails: bool,
}

impl FlakyAdapter {
    fn new(kind: BackendKind) -> Self {
        Self { kind, store: Mutex::new(HashMap::new()), put_failures_remaining: AtomicU32::new(0), fail_kind: Mutex::new(None), delete_always_fails: false }
    }

    fn failing_put(kind: BackendKind, times: u32, error: AdapterError) -> Self {
        Self { kind, store: Mutex::new(HashMap::new()), put_failures_remaining: AtomicU32::new(times), fail_kind: Mutex::new(Some(error)), delete_always_fails: false }
    }

    fn failing_delete(kind: BackendKind) -> Self {
        Self { kind, store: Mutex::new(HashMap::new()), put_failures_remaining: AtomicU32::new(0), fail_kind: Mutex::new(None), delete_always_fails: true }
    }
}

#[async_trait]
impl Adapter for FlakyAdapter {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn put(&self, document_id: &DocumentId, payload: &[u8], _options: PutOptions) -> Result<PutOutcome, AdapterError> {
        let remaining = self.put_failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.put_failures_remaining.fetch_sub(1, Ordering::SeqCst);
            let error = self.fail_kind.lock().clone().unwrap_or_else(|| AdapterError::transient("flaky adapter forced failure"));
            return Err(error);
        }
        self.store.lock().insert(*document_id, payload.to_vec());
        Ok(PutOutcome { native_key: document_id.to_string() })
    }

    async fn get(&self, document_id: &DocumentId) -> Result<Option<Vec<u8>>, AdapterError> {
        Ok(self.store.lock().get(document_id).cloned())
    }

    async fn delete(&self, document_id: &DocumentId, _native_key: &str) -> Result<bool, AdapterError> {
        if self.delete_always_fails {
            return Err(AdapterError::transient("flaky adapter: delete always fails"));
        }
        Ok(self.store.lock().remove(document_id).is_some())
    }

    async fn health(&self) -> Health {
        Health::reachable()
    }
}

/// A `StreamingAdapter` whose `list_chunks` silently reports fewer uploaded
/// chunks than were actually requested — the observable symptom of a
/// backend that dropped data after acknowledging it, without the adapter
/// itself ever returning an error the coordinator could see.
struct LossyStreamingAdapter {
    uploaded: Mutex<Vec<String>>,
}

impl LossyStreamingAdapter {
    fn new() -> Self {
        Self { uploaded: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl Adapter for LossyStreamingAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    async fn put(&self, document_id: &DocumentId, payload: &[u8], options: PutOptions) -> Result<PutOutcome, AdapterError> {
        let _ = (document_id, payload, options);
        Ok(PutOutcome { native_key: "whole".into() })
    }

    async fn get(&self, _document_id: &DocumentId) -> Result<Option<Vec<u8>>, AdapterError> {
        Ok(None)
    }

    async fn delete(&self, _document_id: &DocumentId, _native_key: &str) -> Result<bool, AdapterError> {
        Ok(true)
    }

    async fn health(&self) -> Health {
        Health::reachable()
    }
}

#[async_trait]
impl StreamingAdapter for LossyStreamingAdapter {
    async fn stream_put(&self, _document_id: &DocumentId, chunk: StreamChunk) -> Result<PutOutcome, AdapterError> {
        // Acknowledge every chunk but only remember every other one, as if
        // a write silently failed to persist behind a success response.
        let mut uploaded = self.uploaded.lock();
        if chunk.ordinal.is_multiple_of(2) {
            uploaded.push(chunk.idempotency_key.clone());
        }
        Ok(PutOutcome { native_key: chunk.idempotency_key })
    }

    async fn list_chunks(&self, _document_id: &DocumentId) -> Result<Vec<String>, AdapterError> {
        Ok(self.uploaded.lock().clone())
    }
}

fn engine() -> (SagaEngine, Arc<InMemorySagaLog>) {
    let log = Arc::new(InMemorySagaLog::new());
    let metrics = Arc::new(MetricsService::new("test_fault_injection").unwrap());
    (SagaEngine::new(log.clone(), metrics, CoordinatorConfig::default().saga), log)
}

/// S2: an integrity-gate failure after a completed payload upload rolls
/// back every step that ran before it, and performs no writes beyond it.
#[tokio::test]
async fn integrity_gate_failure_rolls_back_the_metadata_and_payload_steps() {
    let (engine, _log) = engine();
    let document_id = DocumentId::new();

    let relational: Arc<dyn Adapter> = Arc::new(FlakyAdapter::new(BackendKind::Relational));
    let document: Arc<dyn Adapter> = Arc::new(LossyStreamingAdapter::new());
    let streaming: Arc<dyn StreamingAdapter> = Arc::new(LossyStreamingAdapter::new());

    // Upload four chunks directly against the streaming adapter, as the
    // coordinator's chunk-producer pipeline would, before the saga starts.
    for ordinal in 0..4u64 {
        streaming
            .stream_put(&document_id, StreamChunk { ordinal, bytes: vec![ordinal as u8; 4], idempotency_key: format!("{document_id}:{ordinal}") })
            .await
            .unwrap();
    }
    let native_keys = streaming.list_chunks(&document_id).await.unwrap();
    assert_eq!(native_keys.len(), 2, "two of the four chunks were silently dropped");

    let summary = polystore::infrastructure::streaming::StreamSummary { total_size: 16, aggregate_hash: ContentHash::of(b"irrelevant-for-this-test") };

    let definition = SagaDefinition::new()
        .then(metadata_write(relational.clone(), b"{}".to_vec(), RetryPolicy { max_attempts: 1, ..Default::default() }))
        .then(payload_stream(document, native_keys, summary))
        .then(integrity_gate(streaming, "expected-hash-that-never-matches".to_string(), 999));

    let mut record = engine.run(document_id, definition, CancellationToken::new()).await.unwrap();

    assert_eq!(record.status, SagaStatus::RolledBack);
    assert_eq!(record.step_mut("MetadataWrite").unwrap().status, StepStatus::Compensated);
    assert_eq!(record.step_mut("PayloadStream").unwrap().status, StepStatus::Compensated);
    assert_eq!(record.step_mut("IntegrityGate").unwrap().status, StepStatus::Failed);
    assert!(relational.get(&document_id).await.unwrap().is_none());
}

/// S3: a step whose adapter fails twice with a transient error then
/// succeeds completes within the default retry budget, with the recorded
/// attempt count reflecting every attempt actually made.
#[tokio::test]
async fn a_step_that_fails_twice_transiently_then_succeeds_completes_on_the_third_attempt() {
    let (engine, _log) = engine();
    let document_id = DocumentId::new();

    let vector_adapter: Arc<dyn Adapter> = Arc::new(FlakyAdapter::failing_put(BackendKind::Vector, 2, AdapterError::transient("backend momentarily unavailable")));

    let definition = SagaDefinition::new().then(vector_write(vector_adapter.clone(), b"[0.1,0.2]".to_vec(), RetryPolicy::default()));

    let record = engine.run(document_id, definition, CancellationToken::new()).await.unwrap();

    assert_eq!(record.status, SagaStatus::Completed);
    let step = record.steps.iter().find(|s| s.step_name == "VectorWrite").unwrap();
    assert_eq!(step.attempts, 3);
    assert!(vector_adapter.get(&document_id).await.unwrap().is_some());
}

/// S4: when a later step fails and an earlier step's compensation itself
/// fails, the saga ends `partial_failure` and the failure is recorded
/// against the exact native key that could not be cleaned up.
#[tokio::test]
async fn a_failing_compensation_yields_partial_failure_and_logs_the_native_key() {
    let (engine, log) = engine();
    let document_id = DocumentId::new();

    let vector_adapter: Arc<dyn Adapter> = Arc::new(FlakyAdapter::failing_delete(BackendKind::Vector));
    let graph_adapter: Arc<dyn Adapter> = Arc::new(FlakyAdapter::failing_put(BackendKind::Graph, u32::MAX, AdapterError::permanent("graph backend rejected the write")));

    let definition = SagaDefinition::new()
        .then(vector_write(vector_adapter.clone(), b"[0.1]".to_vec(), RetryPolicy { max_attempts: 1, ..Default::default() }))
        .then(graph_write(graph_adapter, b"[]".to_vec(), RetryPolicy { max_attempts: 1, ..Default::default() }));

    let mut record = engine.run(document_id, definition, CancellationToken::new()).await.unwrap();

    assert_eq!(record.status, SagaStatus::PartialFailure);
    assert_eq!(record.step_mut("VectorWrite").unwrap().status, StepStatus::Failed);

    let critical_failures = log.critical_failures();
    assert_eq!(critical_failures.len(), 1);
    let (_, step_name, native_keys, _) = &critical_failures[0];
    assert_eq!(step_name, "VectorWrite");
    assert_eq!(native_keys, &[document_id.to_string()]);
}
