// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Chunking Pipeline
//!
//! Reads an arbitrary `AsyncRead` source lazily, in fixed-size chunks (spec
//! §4.4 step 1), without ever buffering the whole payload in memory — the
//! large-payload requirement (spec §8 S6). Chunks are handed to the consumer
//! over a bounded channel so a slow uploader applies backpressure to the
//! reader instead of the producer racing ahead and exhausting memory.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use polystore_domain::error::AdapterError;
use polystore_domain::services::{StreamChunk, StreamingAdapter};
use polystore_domain::value_objects::{ContentHash, DocumentId, RollingHasher};

use crate::infrastructure::config::RetryPolicy;
use crate::infrastructure::runtime::CancellationToken;

use super::retry::retry_with_backoff;

/// One chunk of a streamed payload, ready to hand to a [`StreamingAdapter`](polystore_domain::services::StreamingAdapter).
#[derive(Debug, Clone)]
pub struct ChunkPayload {
    pub ordinal: u64,
    pub bytes: Vec<u8>,
    pub hash: ContentHash,
    pub byte_range: (u64, u64),
}

/// Emitted once the source is fully consumed: the running totals needed to
/// validate the contiguous-cover and aggregate-hash invariants (spec §8
/// invariant 6).
#[derive(Debug, Clone)]
pub struct StreamSummary {
    pub total_size: u64,
    pub aggregate_hash: ContentHash,
}

/// Spawns a task that reads `source` into `chunk_size`-sized chunks and
/// sends each over the returned channel, backpressured by its bounded
/// capacity. The join handle resolves to the stream summary once the source
/// is exhausted, or an I/O error if the read failed.
pub fn spawn_chunk_producer<R>(mut source: R, chunk_size: usize) -> (mpsc::Receiver<ChunkPayload>, JoinHandle<std::io::Result<StreamSummary>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(4);

    let handle = tokio::spawn(async move {
        let mut hasher = RollingHasher::new();
        let mut ordinal = 0u64;
        let mut offset = 0u64;

        loop {
            let mut buf = vec![0u8; chunk_size];
            let filled = read_up_to(&mut source, &mut buf).await?;
            if filled == 0 {
                break;
            }
            buf.truncate(filled);

            hasher.update(&buf);
            let hash = ContentHash::of(&buf);
            let byte_range = (offset, offset + filled as u64);
            offset += filled as u64;

            let payload = ChunkPayload { ordinal, bytes: buf, hash, byte_range };
            ordinal += 1;
            if tx.send(payload).await.is_err() {
                break;
            }
        }

        Ok(StreamSummary { total_size: offset, aggregate_hash: hasher.finalize() })
    });

    (rx, handle)
}

/// Drains `chunks` one at a time, uploading each via `stream_put` with its
/// own retry/backoff budget (spec §4.4 step 2), and returns the native keys
/// in upload order. Never holds more than the chunk currently in flight plus
/// the small native-key strings already produced — the bounded-memory
/// requirement for large payloads (spec §8 S6) lives here, not in the saga
/// step that later only records the manifest.
pub async fn upload_chunks(
    adapter: Arc<dyn StreamingAdapter>,
    mut chunks: mpsc::Receiver<ChunkPayload>,
    document_id: DocumentId,
    policy: RetryPolicy,
    cancellation: CancellationToken,
) -> Result<Vec<String>, AdapterError> {
    let mut native_keys = Vec::new();

    while let Some(chunk) = chunks.recv().await {
        let ordinal = chunk.ordinal;
        let idempotency_key = format!("{document_id}:{ordinal}");
        let adapter = adapter.clone();
        let bytes = chunk.bytes;

        let outcome = retry_with_backoff(&policy, &cancellation, move |_attempt| {
            let adapter = adapter.clone();
            let bytes = bytes.clone();
            let idempotency_key = idempotency_key.clone();
            async move { adapter.stream_put(&document_id, StreamChunk { ordinal, bytes, idempotency_key }).await }
        })
        .await?;

        native_keys.push(outcome.native_key);
    }

    Ok(native_keys)
}

/// Fills `buf` as much as possible, stopping only at EOF. A single `read()`
/// call may return fewer bytes than requested without being at EOF.
async fn read_up_to<R: AsyncRead + Unpin>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
