// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Backend Adapter Capability Surface
//!
//! A uniform capability surface implemented once per storage kind (spec
//! §4.1). Represented as a set of traits rather than a class hierarchy
//! (spec §9): a backend implements [`Adapter`] and, where the underlying
//! store supports it, [`StreamingAdapter`]. The saga builders construct
//! steps directly against the concrete trait a backend offers — there is
//! no capability probing, since every call site in this coordinator already
//! knows which adapter it's wiring up.

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::value_objects::DocumentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Reachable,
    Degraded,
    Down,
}

#[derive(Debug, Clone)]
pub struct Health {
    pub status: HealthStatus,
    pub last_error: Option<String>,
}

impl Health {
    pub fn reachable() -> Self {
        Self { status: HealthStatus::Reachable, last_error: None }
    }

    pub fn down(last_error: impl Into<String>) -> Self {
        Self { status: HealthStatus::Down, last_error: Some(last_error.into()) }
    }
}

/// Put options honored by every adapter.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// When set, `put` must be idempotent: re-issuing the same key with the
    /// same idempotency key is a no-op that returns the original native key.
    pub idempotency_key: Option<String>,
}

/// Outcome of a single `put`: the adapter-native key, required so the saga
/// coordinator can later drive compensation (spec §3 "Ownership").
#[derive(Debug, Clone)]
pub struct PutOutcome {
    pub native_key: String,
}

/// The minimum capability every backend adapter must provide (spec §4.1).
#[async_trait]
pub trait Adapter: Send + Sync {
    fn kind(&self) -> crate::entities::BackendKind;

    async fn put(&self, document_id: &DocumentId, payload: &[u8], options: PutOptions) -> Result<PutOutcome, AdapterError>;

    async fn get(&self, document_id: &DocumentId) -> Result<Option<Vec<u8>>, AdapterError>;

    /// Must be idempotent: deleting an absent key is not an error.
    async fn delete(&self, document_id: &DocumentId, native_key: &str) -> Result<bool, AdapterError>;

    async fn health(&self) -> Health;
}

/// A single lazily-produced chunk handed to [`StreamingAdapter::stream_put`].
pub struct StreamChunk {
    pub ordinal: u64,
    pub bytes: Vec<u8>,
    pub idempotency_key: String,
}

#[async_trait]
pub trait StreamingAdapter: Adapter {
    /// Uploads one chunk, returning its native key. The streaming pipeline
    /// (spec §4.4) drives retries around this call itself; the adapter only
    /// needs to report the right [`crate::error::AdapterErrorKind`].
    async fn stream_put(&self, document_id: &DocumentId, chunk: StreamChunk) -> Result<PutOutcome, AdapterError>;

    /// Lists the native keys already uploaded for `document_id`, used by
    /// integrity verification (spec §4.4 step 3b).
    async fn list_chunks(&self, document_id: &DocumentId) -> Result<Vec<String>, AdapterError>;
}
