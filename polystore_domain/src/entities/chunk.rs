// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Entity
//!
//! A chunk of a [`crate::entities::Document`]'s payload, produced by the
//! streaming upload pipeline (spec §3, §4.4). For any document in
//! processing/completed state, its chunk set is either empty (non-streaming
//! path) or forms a contiguous cover of `[0, size)` with matching per-chunk
//! and aggregate hashes.

use serde::{Deserialize, Serialize};

use crate::value_objects::{ChunkId, ContentHash, DocumentId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub document_id: DocumentId,
    pub chunk_id: ChunkId,
    pub ordinal: u64,
    pub byte_range: (u64, u64),
    pub hash: ContentHash,
    pub uploaded: bool,
    pub native_key: Option<String>,
}

impl Chunk {
    pub fn new(document_id: DocumentId, ordinal: u64, byte_range: (u64, u64), hash: ContentHash) -> Self {
        let chunk_id = ChunkId::new(&document_id, ordinal);
        Self { document_id, chunk_id, ordinal, byte_range, hash, uploaded: false, native_key: None }
    }

    pub fn mark_uploaded(&mut self, native_key: impl Into<String>) {
        self.uploaded = true;
        self.native_key = Some(native_key.into());
    }

    pub fn len(&self) -> u64 {
        self.byte_range.1 - self.byte_range.0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Checks that a set of chunks forms a contiguous cover of `[0, total_size)`
/// with no gaps or overlaps (spec §3 invariant).
pub fn chunks_form_contiguous_cover(chunks: &[Chunk], total_size: u64) -> bool {
    if chunks.is_empty() {
        return total_size == 0;
    }
    let mut sorted: Vec<&Chunk> = chunks.iter().collect();
    sorted.sort_by_key(|c| c.ordinal);
    let mut expected_start = 0u64;
    for chunk in sorted {
        if chunk.byte_range.0 != expected_start {
            return false;
        }
        expected_start = chunk.byte_range.1;
    }
    expected_start == total_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::DocumentId;

    fn chunk(doc: &DocumentId, ordinal: u64, range: (u64, u64)) -> Chunk {
        Chunk::new(*doc, ordinal, range, ContentHash::of(b"x"))
    }

    #[test]
    fn contiguous_chunks_cover_the_full_range() {
        let doc = DocumentId::new();
        let chunks = vec![chunk(&doc, 0, (0, 10)), chunk(&doc, 1, (10, 20))];
        assert!(chunks_form_contiguous_cover(&chunks, 20));
    }

    #[test]
    fn a_gap_is_not_a_cover() {
        let doc = DocumentId::new();
        let chunks = vec![chunk(&doc, 0, (0, 10)), chunk(&doc, 1, (15, 20))];
        assert!(!chunks_form_contiguous_cover(&chunks, 20));
    }

    #[test]
    fn empty_chunk_set_covers_only_a_zero_size_document() {
        assert!(chunks_form_contiguous_cover(&[], 0));
        assert!(!chunks_form_contiguous_cover(&[], 10));
    }
}
