//! Entities: objects with identity that persists through state changes.

mod backend_kind;
mod cache_entry;
mod chunk;
mod document;
mod graph_relation;
mod materialized_view;
mod saga_execution;
mod vector_record;

pub use backend_kind::BackendKind;
pub use cache_entry::CacheEntry;
pub use chunk::{chunks_form_contiguous_cover, Chunk};
pub use document::{Document, ProcessingStatus, ReferenceMap};
pub use graph_relation::{is_reachable, GraphRelation};
pub use materialized_view::MaterializedView;
pub use saga_execution::{SagaExecutionRecord, SagaStatus, StepOutcome, StepStatus};
pub use vector_record::{all_same_dimension, VectorRecord};
