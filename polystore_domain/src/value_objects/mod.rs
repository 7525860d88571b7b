//! Value objects: immutable, self-validating, identity-free domain concepts.

mod chunk_id;
mod content_hash;
mod document_id;
mod generic_id;
mod relation_id;

pub use chunk_id::ChunkId;
pub use content_hash::{ContentHash, RollingHasher};
pub use document_id::{CorrelationId, DocumentId, SagaId};
pub use generic_id::{GenericId, IdCategory};
pub use relation_id::RelationId;
