// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Document Cache
//!
//! The concurrency-bearing implementation of the domain's [`Cache`] contract
//! (spec §4.3): a `parking_lot::Mutex`-guarded `lru::LruCache` with
//! TTL-on-access. Every operation's critical section is O(1) and never
//! performs backend I/O while holding the lock, per the contract's
//! requirement.

use std::num::NonZeroUsize;

use chrono::Duration as ChronoDuration;
use lru::LruCache;
use parking_lot::Mutex;

use polystore_domain::entities::{CacheEntry, MaterializedView};
use polystore_domain::services::{Cache, CacheStats};
use polystore_domain::value_objects::DocumentId;

struct State {
    entries: LruCache<DocumentId, CacheEntry>,
    stats: CacheStats,
}

pub struct DocumentCache {
    state: Mutex<State>,
    default_ttl: Option<ChronoDuration>,
}

impl DocumentCache {
    pub fn new(max_size: usize, default_ttl_seconds: u64) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
        let default_ttl = if default_ttl_seconds == 0 { None } else { Some(ChronoDuration::seconds(default_ttl_seconds as i64)) };

        Self { state: Mutex::new(State { entries: LruCache::new(capacity), stats: CacheStats::default() }), default_ttl }
    }

    /// Removes every entry whose TTL has lazily expired, used by the
    /// background sweeper (spec §4.3's `auto_cleanup_interval_seconds`).
    /// Returns how many entries were swept.
    pub fn sweep_expired(&self) -> usize {
        let now = chrono::Utc::now();
        let mut guard = self.state.lock();

        let expired: Vec<DocumentId> = guard
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            guard.entries.pop(id);
        }
        guard.stats.evictions += expired.len() as u64;
        guard.stats.current_size = guard.entries.len();
        expired.len()
    }
}

impl Cache for DocumentCache {
    fn get(&self, document_id: &DocumentId) -> Option<MaterializedView> {
        let start = std::time::Instant::now();
        let now = chrono::Utc::now();
        let mut guard = self.state.lock();

        let expired = matches!(guard.entries.peek(document_id), Some(entry) if entry.is_expired(now));
        if expired {
            guard.entries.pop(document_id);
            guard.stats.misses += 1;
            guard.stats.evictions += 1;
            guard.stats.current_size = guard.entries.len();
            record_access(&mut guard.stats, start.elapsed());
            return None;
        }

        let hit = guard.entries.get_mut(document_id).map(|entry| {
            entry.touch(now);
            entry.view.clone()
        });

        if hit.is_some() {
            guard.stats.hits += 1;
        } else {
            guard.stats.misses += 1;
        }
        record_access(&mut guard.stats, start.elapsed());
        hit
    }

    fn put(&self, document_id: DocumentId, view: MaterializedView) {
        let mut guard = self.state.lock();
        let entry = CacheEntry::new(view, self.default_ttl);
        if guard.entries.push(document_id, entry).is_some() {
            guard.stats.evictions += 1;
        }
        guard.stats.current_size = guard.entries.len();
    }

    fn invalidate(&self, document_id: &DocumentId) {
        let mut guard = self.state.lock();
        if guard.entries.pop(document_id).is_some() {
            guard.stats.invalidations += 1;
        }
        guard.stats.current_size = guard.entries.len();
    }

    fn invalidate_matching(&self, predicate: &dyn Fn(&DocumentId) -> bool) {
        let mut guard = self.state.lock();
        let matching: Vec<DocumentId> = guard.entries.iter().map(|(id, _)| *id).filter(|id| predicate(id)).collect();
        for id in &matching {
            guard.entries.pop(id);
        }
        guard.stats.invalidations += matching.len() as u64;
        guard.stats.current_size = guard.entries.len();
    }

    fn clear(&self) {
        let mut guard = self.state.lock();
        guard.entries.clear();
        guard.stats.current_size = 0;
    }

    fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }
}

/// Folds one `get` call's latency into the running mean, using the online
/// update `avg += (x - avg) / n` so no per-access history needs to be kept.
fn record_access(stats: &mut CacheStats, elapsed: std::time::Duration) {
    let total = stats.hits + stats.misses;
    if total == 0 {
        return;
    }
    let micros = elapsed.as_secs_f64() * 1_000_000.0;
    stats.avg_access_time_micros += (micros - stats.avg_access_time_micros) / total as f64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use polystore_domain::entities::Document;
    use polystore_domain::value_objects::ContentHash;

    fn view() -> MaterializedView {
        MaterializedView::from_document(Document::new("ref", ContentHash::of(b"x"), 1, "text/plain"))
    }

    #[test]
    fn a_miss_then_put_then_hit_updates_stats() {
        let cache = DocumentCache::new(10, 300);
        let id = DocumentId::new();

        assert!(cache.get(&id).is_none());
        cache.put(id, view());
        assert!(cache.get(&id).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn eviction_happens_at_capacity() {
        let cache = DocumentCache::new(1, 300);
        let a = DocumentId::new();
        let b = DocumentId::new();

        cache.put(a, view());
        cache.put(b, view());

        assert!(cache.get(&a).is_none());
        assert!(cache.get(&b).is_some());
        assert!(cache.stats().evictions >= 1);
    }

    #[test]
    fn zero_ttl_setting_means_entries_never_expire() {
        let cache = DocumentCache::new(10, 0);
        let id = DocumentId::new();
        cache.put(id, view());
        assert!(cache.get(&id).is_some());
    }

    #[test]
    fn invalidate_removes_a_specific_entry() {
        let cache = DocumentCache::new(10, 300);
        let id = DocumentId::new();
        cache.put(id, view());
        cache.invalidate(&id);
        assert!(cache.get(&id).is_none());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = DocumentCache::new(10, 300);
        cache.put(DocumentId::new(), view());
        cache.clear();
        assert_eq!(cache.stats().current_size, 0);
    }

    #[test]
    fn every_get_contributes_to_the_average_access_time() {
        let cache = DocumentCache::new(10, 300);
        let id = DocumentId::new();

        cache.put(id, view());
        cache.get(&id);
        cache.get(&DocumentId::new());

        assert!(cache.stats().avg_access_time_micros >= 0.0);
        assert_eq!(cache.stats().hits + cache.stats().misses, 2);
    }

    #[test]
    fn sweep_expired_removes_only_entries_past_their_ttl() {
        let cache = DocumentCache::new(10, 300);
        let id = DocumentId::new();
        cache.put(id, view());
        assert_eq!(cache.sweep_expired(), 0);
    }
}
