// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Polystore Domain
//!
//! Pure business logic for the polyglot-persistence saga coordinator:
//! entities, value objects, domain services (as ports), repositories (as
//! ports), and domain events. Independent of any async runtime, database
//! driver, or wire format — infrastructure adapters in the `polystore`
//! crate implement the traits defined here.
//!
//! ## Module Structure
//!
//! - [`entities`]: `Document`, `Chunk`, `VectorRecord`, `GraphRelation`,
//!   `CacheEntry`, `MaterializedView`, `SagaExecutionRecord` — objects with
//!   identity that persists through state changes.
//! - [`value_objects`]: `DocumentId`, `ChunkId`, `RelationId`,
//!   `ContentHash` — immutable, self-validating, identity-free values.
//! - [`services`]: the `Adapter`/`StreamingAdapter` capability surface
//!   (spec §4.1), the `Cache` contract (spec §4.3), and `IdentityService`
//!   (spec §4.2).
//! - [`repositories`]: the `SagaLog` port (spec §4.5, §6).
//! - [`events`]: saga lifecycle events.
//! - [`error`]: the `CoordinatorError`/`AdapterError` taxonomy (spec §7).

pub mod entities;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use entities::{BackendKind, Document, MaterializedView, ProcessingStatus};
pub use error::{AdapterError, AdapterErrorKind, CoordinatorError};
pub use value_objects::{ChunkId, ContentHash, DocumentId, RelationId, SagaId};
