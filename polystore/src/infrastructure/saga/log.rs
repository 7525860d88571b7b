// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Saga Log Implementations
//!
//! `InMemorySagaLog` (tests; crash recovery disabled per spec §6) and
//! `NdjsonSagaLog` (durable, append-only, one JSON object per line per spec
//! §6's log format, serialized per saga id with a `tokio::sync::Mutex` per
//! file handle so concurrent sagas never interleave partial lines).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex as SyncMutex;
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as AsyncMutex;

use polystore_domain::entities::SagaExecutionRecord;
use polystore_domain::error::CoordinatorError;
use polystore_domain::repositories::SagaLog;
use polystore_domain::value_objects::SagaId;

/// `(saga_id, step_name, native_key, error)` — a compensation that itself failed.
type CriticalFailure = (SagaId, String, Vec<String>, String);

#[derive(Default)]
pub struct InMemorySagaLog {
    records: SyncMutex<HashMap<SagaId, SagaExecutionRecord>>,
    failed_cleanups: SyncMutex<Vec<(SagaId, String, String)>>,
    critical_failures: SyncMutex<Vec<CriticalFailure>>,
}

impl InMemorySagaLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failed_cleanups(&self) -> Vec<(SagaId, String, String)> {
        self.failed_cleanups.lock().clone()
    }

    pub fn critical_failures(&self) -> Vec<CriticalFailure> {
        self.critical_failures.lock().clone()
    }
}

#[async_trait]
impl SagaLog for InMemorySagaLog {
    async fn persist(&self, record: &SagaExecutionRecord) -> Result<(), CoordinatorError> {
        self.records.lock().insert(record.saga_id, record.clone());
        Ok(())
    }

    async fn load(&self, saga_id: &SagaId) -> Result<Option<SagaExecutionRecord>, CoordinatorError> {
        Ok(self.records.lock().get(saga_id).cloned())
    }

    async fn log_failed_cleanup(&self, saga_id: &SagaId, native_key: &str, error: &str) -> Result<(), CoordinatorError> {
        self.failed_cleanups.lock().push((*saga_id, native_key.to_string(), error.to_string()));
        Ok(())
    }

    async fn log_critical_failure(&self, saga_id: &SagaId, step_name: &str, native_keys: &[String], error: &str) -> Result<(), CoordinatorError> {
        self.critical_failures.lock().push((*saga_id, step_name.to_string(), native_keys.to_vec(), error.to_string()));
        Ok(())
    }
}

#[derive(Serialize)]
struct LogLine<'a> {
    record_kind: &'static str,
    saga_id: SagaId,
    #[serde(skip_serializing_if = "Option::is_none")]
    step_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    native_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    timestamp: chrono::DateTime<Utc>,
}

/// Durable saga log (spec §6): one newline-delimited JSON record per saga
/// state transition, plus the `failed_cleanups` and `critical_failures`
/// append-only sidecars. Writes for a given saga id are serialized by the
/// per-path `write_lock`; separate log files never block each other.
pub struct NdjsonSagaLog {
    records_path: PathBuf,
    failed_cleanups_path: PathBuf,
    critical_failures_path: PathBuf,
    write_lock: AsyncMutex<()>,
}

impl NdjsonSagaLog {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        Self {
            records_path: directory.join("saga_records.ndjson"),
            failed_cleanups_path: directory.join("failed_cleanups.ndjson"),
            critical_failures_path: directory.join("critical_failures.ndjson"),
            write_lock: AsyncMutex::new(()),
        }
    }

    async fn append_line(&self, path: &Path, line: &str) -> Result<(), CoordinatorError> {
        let _guard = self.write_lock.lock().await;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_lines(&self, path: &Path) -> Result<Vec<String>, CoordinatorError> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SagaLog for NdjsonSagaLog {
    async fn persist(&self, record: &SagaExecutionRecord) -> Result<(), CoordinatorError> {
        let line = serde_json::to_string(record)?;
        self.append_line(&self.records_path, &line).await
    }

    async fn load(&self, saga_id: &SagaId) -> Result<Option<SagaExecutionRecord>, CoordinatorError> {
        let lines = self.read_lines(&self.records_path).await?;
        let mut latest = None;
        for line in lines {
            if let Ok(record) = serde_json::from_str::<SagaExecutionRecord>(&line) {
                if record.saga_id == *saga_id {
                    latest = Some(record);
                }
            }
        }
        Ok(latest)
    }

    async fn log_failed_cleanup(&self, saga_id: &SagaId, native_key: &str, error: &str) -> Result<(), CoordinatorError> {
        let line = LogLine {
            record_kind: "failed_cleanup",
            saga_id: *saga_id,
            step_name: None,
            status: None,
            native_keys: vec![native_key.to_string()],
            error: Some(error),
            timestamp: Utc::now(),
        };
        let line = serde_json::to_string(&line)?;
        self.append_line(&self.failed_cleanups_path, &line).await
    }

    async fn log_critical_failure(&self, saga_id: &SagaId, step_name: &str, native_keys: &[String], error: &str) -> Result<(), CoordinatorError> {
        let line = LogLine {
            record_kind: "critical_failure",
            saga_id: *saga_id,
            step_name: Some(step_name),
            status: None,
            native_keys: native_keys.to_vec(),
            error: Some(error),
            timestamp: Utc::now(),
        };
        let line = serde_json::to_string(&line)?;
        self.append_line(&self.critical_failures_path, &line).await
    }
}
