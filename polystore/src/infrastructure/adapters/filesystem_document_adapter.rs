// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Filesystem Document Adapter
//!
//! Reference implementation of the raw-payload ("document") backend (spec
//! §4.1), grounded in the teacher's `FileIoServiceAdapter` chunked-read loop
//! shape but written with clean `?`-based error propagation rather than
//! internal `.unwrap()`s. Non-streamed payloads live at
//! `{data_dir}/{document_id}`; streamed chunks land under
//! `{data_dir}/{document_id}.chunks/{ordinal:020}` so a directory listing is
//! already in upload order, and a missing whole-file `get` falls back to
//! concatenating the chunk directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use polystore_domain::entities::BackendKind;
use polystore_domain::error::AdapterError;
use polystore_domain::services::{Adapter, Health, PutOptions, PutOutcome, StreamChunk, StreamingAdapter};
use polystore_domain::value_objects::DocumentId;

pub struct FilesystemDocumentAdapter {
    data_dir: PathBuf,
}

impl FilesystemDocumentAdapter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    fn payload_path(&self, document_id: &DocumentId) -> PathBuf {
        self.data_dir.join(document_id.to_string())
    }

    fn chunks_dir(&self, document_id: &DocumentId) -> PathBuf {
        self.data_dir.join(format!("{document_id}.chunks"))
    }

    async fn ensure_data_dir(&self) -> Result<(), AdapterError> {
        fs::create_dir_all(&self.data_dir).await.map_err(AdapterError::from)
    }

    async fn chunk_paths_in_order(dir: &Path) -> Result<Vec<PathBuf>, AdapterError> {
        let mut entries = fs::read_dir(dir).await.map_err(AdapterError::from)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(AdapterError::from)? {
            paths.push(entry.path());
        }
        paths.sort();
        Ok(paths)
    }
}

#[async_trait]
impl Adapter for FilesystemDocumentAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    async fn put(&self, document_id: &DocumentId, payload: &[u8], _options: PutOptions) -> Result<PutOutcome, AdapterError> {
        self.ensure_data_dir().await?;
        let path = self.payload_path(document_id);
        fs::write(&path, payload).await.map_err(AdapterError::from)?;
        Ok(PutOutcome { native_key: path.display().to_string() })
    }

    async fn get(&self, document_id: &DocumentId) -> Result<Option<Vec<u8>>, AdapterError> {
        let path = self.payload_path(document_id);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let chunks_dir = self.chunks_dir(document_id);
                if !chunks_dir.exists() {
                    return Ok(None);
                }
                let mut assembled = Vec::new();
                for chunk_path in Self::chunk_paths_in_order(&chunks_dir).await? {
                    assembled.extend(fs::read(&chunk_path).await.map_err(AdapterError::from)?);
                }
                Ok(Some(assembled))
            }
            Err(e) => Err(AdapterError::from(e)),
        }
    }

    async fn delete(&self, document_id: &DocumentId, _native_key: &str) -> Result<bool, AdapterError> {
        let path = self.payload_path(document_id);
        let mut deleted = false;

        match fs::remove_file(&path).await {
            Ok(()) => deleted = true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AdapterError::from(e)),
        }

        let chunks_dir = self.chunks_dir(document_id);
        match fs::remove_dir_all(&chunks_dir).await {
            Ok(()) => deleted = true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AdapterError::from(e)),
        }

        Ok(deleted)
    }

    async fn health(&self) -> Health {
        match fs::create_dir_all(&self.data_dir).await {
            Ok(()) => Health::reachable(),
            Err(e) => Health::down(e.to_string()),
        }
    }
}

#[async_trait]
impl StreamingAdapter for FilesystemDocumentAdapter {
    async fn stream_put(&self, document_id: &DocumentId, chunk: StreamChunk) -> Result<PutOutcome, AdapterError> {
        let dir = self.chunks_dir(document_id);
        fs::create_dir_all(&dir).await.map_err(AdapterError::from)?;

        let chunk_path = dir.join(format!("{:020}", chunk.ordinal));

        // Idempotent: re-uploading the same ordinal with identical bytes is
        // a no-op rather than a conflict (spec §4.4 step 2).
        if let Ok(existing) = fs::read(&chunk_path).await {
            if existing == chunk.bytes {
                return Ok(PutOutcome { native_key: chunk.idempotency_key });
            }
        }

        let mut file = fs::File::create(&chunk_path).await.map_err(AdapterError::from)?;
        file.write_all(&chunk.bytes).await.map_err(AdapterError::from)?;
        file.flush().await.map_err(AdapterError::from)?;

        Ok(PutOutcome { native_key: chunk.idempotency_key })
    }

    async fn list_chunks(&self, document_id: &DocumentId) -> Result<Vec<String>, AdapterError> {
        let dir = self.chunks_dir(document_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let paths = Self::chunk_paths_in_order(&dir).await?;
        Ok(paths
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips_a_whole_payload() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FilesystemDocumentAdapter::new(dir.path());
        let id = DocumentId::new();

        adapter.put(&id, b"payload bytes", PutOptions::default()).await.unwrap();
        assert_eq!(adapter.get(&id).await.unwrap(), Some(b"payload bytes".to_vec()));
    }

    #[tokio::test]
    async fn streamed_chunks_assemble_in_ordinal_order_on_get() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FilesystemDocumentAdapter::new(dir.path());
        let id = DocumentId::new();

        adapter.stream_put(&id, StreamChunk { ordinal: 1, bytes: b"world".to_vec(), idempotency_key: "k1".into() }).await.unwrap();
        adapter.stream_put(&id, StreamChunk { ordinal: 0, bytes: b"hello ".to_vec(), idempotency_key: "k0".into() }).await.unwrap();

        assert_eq!(adapter.get(&id).await.unwrap(), Some(b"hello world".to_vec()));
    }

    #[tokio::test]
    async fn repeated_stream_put_of_the_same_chunk_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FilesystemDocumentAdapter::new(dir.path());
        let id = DocumentId::new();

        let a = adapter.stream_put(&id, StreamChunk { ordinal: 0, bytes: b"x".to_vec(), idempotency_key: "k0".into() }).await.unwrap();
        let b = adapter.stream_put(&id, StreamChunk { ordinal: 0, bytes: b"x".to_vec(), idempotency_key: "k0".into() }).await.unwrap();
        assert_eq!(a.native_key, b.native_key);

        assert_eq!(adapter.list_chunks(&id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_of_missing_document_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FilesystemDocumentAdapter::new(dir.path());
        assert_eq!(adapter.get(&DocumentId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_both_whole_payload_and_chunk_directory() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FilesystemDocumentAdapter::new(dir.path());
        let id = DocumentId::new();

        adapter.put(&id, b"x", PutOptions::default()).await.unwrap();
        adapter.stream_put(&id, StreamChunk { ordinal: 0, bytes: b"y".to_vec(), idempotency_key: "k".into() }).await.unwrap();

        assert!(adapter.delete(&id, "").await.unwrap());
        assert_eq!(adapter.get(&id).await.unwrap(), None);
        assert!(!adapter.delete(&id, "").await.unwrap());
    }
}
