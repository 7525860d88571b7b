// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Ten concurrent reads of the same freshly-written (hence uncached)
//! document must all observe a coherent view, whether or not the backend
//! fan-out itself is coalesced into a single call.

use std::sync::Arc;

use polystore::infrastructure::adapters::{FilesystemDocumentAdapter, InMemoryGraphAdapter, InMemoryVectorAdapter, SqliteRelationalAdapter};
use polystore::infrastructure::CoordinatorConfig;
use polystore::{Coordinator, ReadOptions, WriteRequest};

#[tokio::test]
async fn ten_concurrent_reads_of_an_uncached_document_all_see_the_same_view() {
    let dir = tempfile::tempdir().unwrap();
    let relational = Arc::new(SqliteRelationalAdapter::in_memory().await.unwrap());
    let document = Arc::new(FilesystemDocumentAdapter::new(dir.path().to_path_buf()));
    let vector = Arc::new(InMemoryVectorAdapter::new());
    let graph = Arc::new(InMemoryGraphAdapter::new());
    let coordinator = Arc::new(Coordinator::new(CoordinatorConfig::default(), relational, document, vector, graph).unwrap());

    let request = WriteRequest::new("ref", "text/plain", serde_json::json!({"k": "v"}));
    let written = coordinator.write_document(request).await.unwrap();

    // A successful write invalidates the cache, so every reader below races
    // to populate it from a genuine miss.
    let mut handles = Vec::new();
    for _ in 0..10 {
        let coordinator = coordinator.clone();
        let document_id = written.document_id;
        handles.push(tokio::spawn(async move { coordinator.read_document(document_id, ReadOptions::default()).await.unwrap().unwrap() }));
    }

    let mut views = Vec::new();
    for handle in handles {
        views.push(handle.await.unwrap());
    }

    let first = &views[0];
    for view in &views {
        assert_eq!(view.document.document_id, first.document.document_id);
        assert_eq!(view.document.content_hash, first.document.content_hash);
        assert_eq!(view.document.original_file_reference, first.document.original_file_reference);
    }

    // Regardless of coalescing, the cache now holds the document: a later
    // read is served from it.
    let cached = coordinator.read_document(written.document_id, ReadOptions::default()).await.unwrap().unwrap();
    assert!(cached.cached);

    coordinator.shutdown();
}
