// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite Relational Adapter
//!
//! Reference implementation of the metadata ("relational") backend (spec
//! §4.1), mirroring the teacher's `SqlitePipelineRepository`: a `sqlx`
//! connection pool, schema created on first connect, and parameterized
//! queries keyed by `document_id`. Payload bytes are stored as an opaque
//! JSON-compatible blob — the adapter does not interpret `Document`
//! structure, it just persists whatever bytes the coordinator hands it
//! under a key.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::debug;

use polystore_domain::entities::BackendKind;
use polystore_domain::error::AdapterError;
use polystore_domain::services::{Adapter, Health, PutOptions, PutOutcome};
#[cfg(test)]
use polystore_domain::services::HealthStatus;
use polystore_domain::value_objects::DocumentId;

pub struct SqliteRelationalAdapter {
    pool: SqlitePool,
}

impl SqliteRelationalAdapter {
    /// Connects to a file-backed database, creating it and its schema if
    /// absent.
    pub async fn connect(database_path: &str) -> Result<Self, AdapterError> {
        let url = format!("sqlite://{database_path}?mode=rwc");
        Self::connect_url(&url).await
    }

    /// Connects to a private in-memory database, for tests.
    pub async fn in_memory() -> Result<Self, AdapterError> {
        Self::connect_url("sqlite::memory:").await
    }

    async fn connect_url(url: &str) -> Result<Self, AdapterError> {
        debug!(url, "connecting sqlite relational adapter");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| AdapterError::permanent(format!("failed to connect: {e}")))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                document_id TEXT PRIMARY KEY,
                payload BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| AdapterError::permanent(format!("failed to create schema: {e}")))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Adapter for SqliteRelationalAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    async fn put(&self, document_id: &DocumentId, payload: &[u8], options: PutOptions) -> Result<PutOutcome, AdapterError> {
        let native_key = document_id.to_string();

        if options.idempotency_key.is_some() {
            if let Some(existing) = self.get(document_id).await? {
                if existing == payload {
                    return Ok(PutOutcome { native_key });
                }
            }
        }

        sqlx::query("INSERT INTO documents (document_id, payload) VALUES (?, ?) ON CONFLICT(document_id) DO UPDATE SET payload = excluded.payload")
            .bind(&native_key)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(AdapterError::from_sqlx)?;

        Ok(PutOutcome { native_key })
    }

    async fn get(&self, document_id: &DocumentId) -> Result<Option<Vec<u8>>, AdapterError> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT payload FROM documents WHERE document_id = ?")
            .bind(document_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(AdapterError::from_sqlx)?;

        Ok(row.map(|(payload,)| payload))
    }

    async fn delete(&self, document_id: &DocumentId, _native_key: &str) -> Result<bool, AdapterError> {
        let result = sqlx::query("DELETE FROM documents WHERE document_id = ?")
            .bind(document_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(AdapterError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn health(&self) -> Health {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => Health::reachable(),
            Err(e) => Health::down(e.to_string()),
        }
    }
}

trait SqlxErrorExt {
    fn from_sqlx(err: sqlx::Error) -> AdapterError;
}

impl SqlxErrorExt for AdapterError {
    fn from_sqlx(err: sqlx::Error) -> AdapterError {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => AdapterError::transient(err.to_string()),
            sqlx::Error::RowNotFound => AdapterError::not_found(err.to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AdapterError::conflict(err.to_string()),
            _ => AdapterError::permanent(err.to_string()),
        }
    }
}
