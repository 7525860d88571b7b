// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Cache Entry Entity
//!
//! One materialized view held by the single-record read cache (spec §3,
//! §4.3). The entity itself is storage-policy-agnostic; LRU ordering and
//! eviction live in the infrastructure-side cache implementation.

use chrono::{DateTime, Utc};

use crate::entities::MaterializedView;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub view: MaterializedView,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: u64,
    pub ttl: Option<chrono::Duration>,
    pub estimated_size_bytes: usize,
}

impl CacheEntry {
    pub fn new(view: MaterializedView, ttl: Option<chrono::Duration>) -> Self {
        let now = Utc::now();
        let estimated_size_bytes = view.estimated_size_bytes();
        Self { view, created_at: now, last_accessed_at: now, access_count: 0, ttl, estimated_size_bytes }
    }

    /// Lazy TTL expiry check, evaluated at access time (spec §4.3).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => now - self.last_accessed_at > ttl,
            None => false,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed_at = now;
        self.access_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Document;
    use crate::value_objects::ContentHash;

    fn view() -> MaterializedView {
        MaterializedView::from_document(Document::new("ref", ContentHash::of(b"x"), 1, "text/plain"))
    }

    #[test]
    fn entry_expires_after_ttl_elapses_since_last_access() {
        let entry = CacheEntry::new(view(), Some(chrono::Duration::seconds(1)));
        assert!(!entry.is_expired(Utc::now()));
        assert!(entry.is_expired(Utc::now() + chrono::Duration::seconds(2)));
    }

    #[test]
    fn no_ttl_never_expires() {
        let entry = CacheEntry::new(view(), None);
        assert!(!entry.is_expired(Utc::now() + chrono::Duration::days(365)));
    }
}
