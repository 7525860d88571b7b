// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Built-in step constructors (spec §4.5): `metadata_write`, `payload_stream`,
//! `integrity_gate`, `vector_write`, `graph_write`. Each builds a [`Step`]
//! value against one of the four reference adapters; none introduce a new
//! step type.

use std::sync::Arc;

use polystore_domain::error::AdapterError;
use polystore_domain::services::{Adapter, PutOptions, StreamingAdapter};
use polystore_domain::value_objects::ContentHash;

use crate::infrastructure::config::RetryPolicy;
use crate::infrastructure::streaming::StreamSummary;

use super::step::{CompensationError, Step, StepContext};

const MANIFEST_OUTPUT_KEY: &str = "PayloadStream.manifest";

/// Writes structured metadata to the relational adapter.
pub fn metadata_write(adapter: Arc<dyn Adapter>, payload: Vec<u8>, retry_policy: RetryPolicy) -> Step {
    let forward_adapter = adapter.clone();
    let forward_payload = payload;
    let compensate_adapter = adapter;

    Step {
        name: "MetadataWrite",
        critical: false,
        is_integrity_gate: false,
        retry_policy: Some(retry_policy),
        forward: Arc::new(move |ctx: StepContext| {
            let adapter = forward_adapter.clone();
            let payload = forward_payload.clone();
            Box::pin(async move {
                let options = PutOptions { idempotency_key: Some(ctx.idempotency_key.clone()) };
                let outcome = adapter.put(&ctx.document_id, &payload, options).await?;
                Ok(vec![outcome.native_key])
            })
        }),
        compensate: Arc::new(move |ctx: StepContext, native_keys: Vec<String>| {
            let adapter = compensate_adapter.clone();
            Box::pin(async move {
                delete_all_best_effort(adapter.as_ref(), &ctx.document_id, native_keys).await
            })
        }),
    }
}

/// Records the manifest of an already-uploaded, already-verified-in-flight
/// payload (spec §4.4 step 2): the chunk native keys, aggregate hash, and
/// total size, written to the shared step-output channel for
/// `integrity_gate` to read. The upload itself (with per-chunk retry) runs
/// ahead of the saga, driven by [`crate::infrastructure::streaming`], so
/// this step never holds chunk bytes in memory — only the small native-key
/// strings the upload already produced.
pub fn payload_stream(adapter: Arc<dyn Adapter>, native_keys: Vec<String>, summary: StreamSummary) -> Step {
    let forward_keys = native_keys;
    let forward_summary = summary;
    let compensate_adapter = adapter;

    Step {
        name: "PayloadStream",
        critical: false,
        is_integrity_gate: false,
        // Chunk upload already happened, with its own retry, before this
        // saga even started; nothing left in forward worth retrying.
        retry_policy: None,
        forward: Arc::new(move |ctx: StepContext| {
            let native_keys = forward_keys.clone();
            let summary = forward_summary.clone();
            Box::pin(async move {
                let manifest = Manifest { chunk_native_keys: native_keys.clone(), aggregate_hash: summary.aggregate_hash.to_string(), total_size: summary.total_size };
                if let Ok(bytes) = serde_json::to_vec(&manifest) {
                    ctx.outputs.lock().insert(MANIFEST_OUTPUT_KEY.to_string(), bytes);
                }
                Ok(native_keys)
            })
        }),
        compensate: Arc::new(move |ctx: StepContext, native_keys: Vec<String>| {
            let adapter = compensate_adapter.clone();
            Box::pin(async move { delete_all_best_effort(adapter.as_ref(), &ctx.document_id, native_keys).await })
        }),
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Manifest {
    chunk_native_keys: Vec<String>,
    aggregate_hash: String,
    total_size: u64,
}

/// Non-mutating verification step (spec §4.4 step 3, §4.5): re-lists the
/// uploaded chunks from the adapter to catch a count mismatch, then reads
/// back the actually-persisted bytes via `Adapter::get` and independently
/// recomputes their hash and size, comparing against `expected_hash`/
/// `expected_size` — values the caller must derive from the source payload
/// itself (before any adapter write), never from the manifest this same
/// gate is verifying. Comparing the manifest to itself would make the
/// hash/size checks tautological; reading back the adapter's own storage is
/// what actually catches a write that silently truncated or corrupted the
/// payload. Must be placed directly after `payload_stream` and before any
/// write step.
pub fn integrity_gate(adapter: Arc<dyn StreamingAdapter>, expected_hash: String, expected_size: u64) -> Step {
    Step {
        name: "IntegrityGate",
        critical: false,
        is_integrity_gate: true,
        retry_policy: None,
        forward: Arc::new(move |ctx: StepContext| {
            let adapter = adapter.clone();
            let expected_hash = expected_hash.clone();
            Box::pin(async move {
                let manifest_bytes = ctx.outputs.lock().get(MANIFEST_OUTPUT_KEY).cloned();
                let manifest: Manifest = match manifest_bytes {
                    Some(bytes) => serde_json::from_slice(&bytes)
                        .map_err(|e| AdapterError::integrity(format!("malformed manifest: {e}")))?,
                    None => return Err(AdapterError::integrity("no payload manifest recorded before integrity gate")),
                };

                let uploaded = adapter.list_chunks(&ctx.document_id).await?;
                if uploaded.len() != manifest.chunk_native_keys.len() {
                    return Err(AdapterError::integrity(format!(
                        "chunk count mismatch: manifest has {}, adapter reports {}",
                        manifest.chunk_native_keys.len(),
                        uploaded.len()
                    )));
                }

                let stored = adapter
                    .get(&ctx.document_id)
                    .await?
                    .ok_or_else(|| AdapterError::integrity("no payload persisted for this document at the integrity gate"))?;
                let stored_hash = ContentHash::of(&stored).to_string();
                let stored_size = stored.len() as u64;
                if stored_hash != expected_hash || stored_size != expected_size {
                    return Err(AdapterError::integrity(format!(
                        "persisted payload mismatch: expected hash={expected_hash} size={expected_size}, stored hash={stored_hash} size={stored_size}"
                    )));
                }

                Ok(Vec::new())
            })
        }),
        compensate: Arc::new(|_ctx, _keys| Box::pin(async { Ok(()) })),
    }
}

/// Writes a batch of embeddings to the vector adapter.
pub fn vector_write(adapter: Arc<dyn Adapter>, payload: Vec<u8>, retry_policy: RetryPolicy) -> Step {
    let forward_adapter = adapter.clone();
    let compensate_adapter = adapter;

    Step {
        name: "VectorWrite",
        critical: false,
        is_integrity_gate: false,
        retry_policy: Some(retry_policy),
        forward: Arc::new(move |ctx: StepContext| {
            let adapter = forward_adapter.clone();
            let payload = payload.clone();
            Box::pin(async move {
                let options = PutOptions { idempotency_key: Some(ctx.idempotency_key.clone()) };
                let outcome = adapter.put(&ctx.document_id, &payload, options).await?;
                Ok(vec![outcome.native_key])
            })
        }),
        compensate: Arc::new(move |ctx: StepContext, native_keys: Vec<String>| {
            let adapter = compensate_adapter.clone();
            Box::pin(async move { delete_all_best_effort(adapter.as_ref(), &ctx.document_id, native_keys).await })
        }),
    }
}

/// Writes a batch of outgoing relations to the graph adapter.
pub fn graph_write(adapter: Arc<dyn Adapter>, payload: Vec<u8>, retry_policy: RetryPolicy) -> Step {
    let forward_adapter = adapter.clone();
    let compensate_adapter = adapter;

    Step {
        name: "GraphWrite",
        critical: false,
        is_integrity_gate: false,
        retry_policy: Some(retry_policy),
        forward: Arc::new(move |ctx: StepContext| {
            let adapter = forward_adapter.clone();
            let payload = payload.clone();
            Box::pin(async move {
                let options = PutOptions { idempotency_key: Some(ctx.idempotency_key.clone()) };
                let outcome = adapter.put(&ctx.document_id, &payload, options).await?;
                Ok(vec![outcome.native_key])
            })
        }),
        compensate: Arc::new(move |ctx: StepContext, native_keys: Vec<String>| {
            let adapter = compensate_adapter.clone();
            Box::pin(async move { delete_all_best_effort(adapter.as_ref(), &ctx.document_id, native_keys).await })
        }),
    }
}

/// Deletes a document's data from one backend (spec §4.1: `delete` is
/// always idempotent, so `delete_document` models removal as a best-effort
/// fan-out rather than a forward/compensate pair — there is nothing to
/// compensate a delete with).
pub fn delete_step(name: &'static str, adapter: Arc<dyn Adapter>) -> Step {
    Step {
        name,
        critical: false,
        is_integrity_gate: false,
        retry_policy: None,
        forward: Arc::new(move |ctx: StepContext| {
            let adapter = adapter.clone();
            Box::pin(async move {
                adapter.delete(&ctx.document_id, "").await?;
                Ok(Vec::new())
            })
        }),
        compensate: Arc::new(|_ctx, _keys| Box::pin(async { Ok(()) })),
    }
}

/// Deletes every native key best-effort, collecting the ones that still
/// failed after the adapter call itself (no retry here — `delete` isn't
/// taxonomized for retry the way `put`/`stream_put` are; a failed delete is
/// surfaced directly to the caller as a compensation failure).
async fn delete_all_best_effort(adapter: &dyn Adapter, document_id: &polystore_domain::value_objects::DocumentId, native_keys: Vec<String>) -> Result<(), CompensationError> {
    let mut failed = Vec::new();
    let mut last_message = String::new();

    for key in native_keys {
        match adapter.delete(document_id, &key).await {
            Ok(_) => {}
            Err(e) => {
                last_message = e.to_string();
                failed.push(key);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(CompensationError::new(format!("failed to delete {} native key(s): {last_message}", failed.len()), failed))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use polystore_domain::value_objects::{DocumentId, SagaId};

    use super::*;
    use crate::infrastructure::adapters::{InMemoryGraphAdapter, InMemoryVectorAdapter};
    use crate::infrastructure::runtime::CancellationToken;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;

    fn context() -> StepContext {
        let document_id = DocumentId::new();
        StepContext {
            document_id,
            saga_id: SagaId::new(),
            cancellation: CancellationToken::new(),
            outputs: Arc::new(Mutex::new(BTreeMap::new())),
            idempotency_key: format!("{document_id}:test"),
        }
    }

    #[tokio::test]
    async fn vector_write_forward_then_compensate_round_trips() {
        let adapter: Arc<dyn Adapter> = Arc::new(InMemoryVectorAdapter::new());
        let step = vector_write(adapter.clone(), b"[1,2,3]".to_vec(), RetryPolicy::default());
        let ctx = context();

        let keys = (step.forward)(ctx.clone()).await.unwrap();
        assert!(adapter.get(&ctx.document_id).await.unwrap().is_some());

        (step.compensate)(ctx.clone(), keys).await.unwrap();
        assert!(adapter.get(&ctx.document_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn graph_write_rejects_a_payload_with_wrong_source() {
        let adapter: Arc<dyn Adapter> = Arc::new(InMemoryGraphAdapter::new());
        let other = DocumentId::new();
        let relation = polystore_domain::entities::GraphRelation::new(other, DocumentId::new(), "cites", 0.5, 0.5).unwrap();
        let payload = serde_json::to_vec(&vec![relation]).unwrap();

        let step = graph_write(adapter, payload, RetryPolicy::default());
        let ctx = context();
        assert!((step.forward)(ctx).await.is_err());
    }

    #[tokio::test]
    async fn delete_step_removes_a_document_and_is_idempotent_on_replay() {
        let adapter: Arc<dyn Adapter> = Arc::new(InMemoryVectorAdapter::new());
        let ctx = context();
        adapter.put(&ctx.document_id, b"[0.1]", PutOptions::default()).await.unwrap();

        let step = delete_step("VectorDelete", adapter.clone());
        (step.forward)(ctx.clone()).await.unwrap();
        assert!(adapter.get(&ctx.document_id).await.unwrap().is_none());

        // Replaying against an already-deleted document must not error.
        (step.forward)(ctx).await.unwrap();
    }

    #[tokio::test]
    async fn integrity_gate_passes_when_the_manifest_matches_the_uploaded_chunks() {
        use crate::infrastructure::adapters::FilesystemDocumentAdapter;
        use crate::infrastructure::streaming::StreamSummary;
        use polystore_domain::value_objects::ContentHash;

        let dir = tempfile::tempdir().unwrap();
        let adapter: Arc<dyn StreamingAdapter> = Arc::new(FilesystemDocumentAdapter::new(dir.path()));
        let ctx = context();

        adapter
            .stream_put(&ctx.document_id, polystore_domain::services::StreamChunk { ordinal: 0, bytes: b"hi".to_vec(), idempotency_key: "k0".into() })
            .await
            .unwrap();
        let native_keys = adapter.list_chunks(&ctx.document_id).await.unwrap();
        let summary = StreamSummary { total_size: 2, aggregate_hash: ContentHash::of(b"hi") };

        let stream_step = payload_stream(adapter.clone() as Arc<dyn Adapter>, native_keys, summary);
        (stream_step.forward)(ctx.clone()).await.unwrap();

        let gate_step = integrity_gate(adapter, ContentHash::of(b"hi").to_string(), 2);
        assert!((gate_step.forward)(ctx).await.is_ok());
    }

    #[tokio::test]
    async fn integrity_gate_rejects_a_size_mismatch_against_the_actually_persisted_bytes() {
        use crate::infrastructure::adapters::FilesystemDocumentAdapter;
        use crate::infrastructure::streaming::StreamSummary;

        let dir = tempfile::tempdir().unwrap();
        let adapter: Arc<dyn StreamingAdapter> = Arc::new(FilesystemDocumentAdapter::new(dir.path()));
        let ctx = context();

        adapter
            .stream_put(&ctx.document_id, polystore_domain::services::StreamChunk { ordinal: 0, bytes: b"hi".to_vec(), idempotency_key: "k0".into() })
            .await
            .unwrap();
        let native_keys = adapter.list_chunks(&ctx.document_id).await.unwrap();
        // The caller-declared expected size (999) disagrees with what was
        // actually persisted to disk ("hi", 2 bytes) — simulating an
        // adapter that silently wrote less than it acknowledged.
        let summary = StreamSummary { total_size: 999, aggregate_hash: ContentHash::of(b"hi") };

        let stream_step = payload_stream(adapter.clone() as Arc<dyn Adapter>, native_keys, summary);
        (stream_step.forward)(ctx.clone()).await.unwrap();

        let gate_step = integrity_gate(adapter, ContentHash::of(b"hi").to_string(), 999);
        assert!((gate_step.forward)(ctx).await.is_err());
    }

    #[tokio::test]
    async fn integrity_gate_rejects_a_payload_that_was_silently_corrupted_after_upload() {
        use crate::infrastructure::adapters::FilesystemDocumentAdapter;
        use crate::infrastructure::streaming::StreamSummary;

        let dir = tempfile::tempdir().unwrap();
        let adapter: Arc<dyn StreamingAdapter> = Arc::new(FilesystemDocumentAdapter::new(dir.path()));
        let ctx = context();

        adapter
            .stream_put(&ctx.document_id, polystore_domain::services::StreamChunk { ordinal: 0, bytes: b"corrupted".to_vec(), idempotency_key: "k0".into() })
            .await
            .unwrap();
        let native_keys = adapter.list_chunks(&ctx.document_id).await.unwrap();
        let summary = StreamSummary { total_size: 2, aggregate_hash: ContentHash::of(b"hi") };

        let stream_step = payload_stream(adapter.clone() as Arc<dyn Adapter>, native_keys, summary);
        (stream_step.forward)(ctx.clone()).await.unwrap();

        // expected_hash/size ("hi", as the source bytes hashed before
        // upload) disagree with what actually landed on disk ("corrupted").
        let gate_step = integrity_gate(adapter, ContentHash::of(b"hi").to_string(), 2);
        assert!((gate_step.forward)(ctx).await.is_err());
    }
}
