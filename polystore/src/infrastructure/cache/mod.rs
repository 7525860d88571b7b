// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Cache layer (spec §4.3): an LRU+TTL store for materialized document
//! views, plus a background sweeper so entries accessed rarely still expire
//! rather than waiting for cache pressure to evict them.

mod document_cache;
mod sweeper;

pub use document_cache::DocumentCache;
pub use sweeper::run as run_sweeper;
