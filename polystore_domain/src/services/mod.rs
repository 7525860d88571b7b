//! Domain services: stateless ports that coordinate domain objects. Each
//! trait here is implemented by infrastructure-side adapters; the domain
//! only defines the contract (spec §4.1–§4.3).

mod adapter;
mod cache;
mod identity;

pub use adapter::{Adapter, Health, HealthStatus, PutOptions, PutOutcome, StreamChunk, StreamingAdapter};
pub use cache::{Cache, CacheStats};
pub use identity::IdentityService;
