// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Streaming upload pipeline (spec §4.4): lazy chunking of arbitrarily large
//! payloads plus the retry/backoff policy shared with saga step execution.

mod chunking_pipeline;
mod retry;

pub use chunking_pipeline::{spawn_chunk_producer, upload_chunks, ChunkPayload, StreamSummary};
pub use retry::retry_with_backoff;
