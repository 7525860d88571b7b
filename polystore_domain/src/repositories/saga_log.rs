// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Saga Log Repository Port
//!
//! Spec §4.5 step 1: "a Saga Execution Record is persisted... to the
//! relational adapter (or a dedicated durable log if present) before any
//! forward step begins." Also covers the `failed_cleanups` and
//! `critical_failures` append-only logs (spec §4.4, §4.5, §6).

use async_trait::async_trait;

use crate::entities::SagaExecutionRecord;
use crate::error::CoordinatorError;
use crate::value_objects::SagaId;

#[async_trait]
pub trait SagaLog: Send + Sync {
    /// Persists the initial or updated state of a saga execution record.
    /// Writes for a given saga id are serialized (spec §5).
    async fn persist(&self, record: &SagaExecutionRecord) -> Result<(), CoordinatorError>;

    /// Loads the last persisted state of a saga, used to replay a crashed
    /// saga (spec §4.5 "Idempotency").
    async fn load(&self, saga_id: &SagaId) -> Result<Option<SagaExecutionRecord>, CoordinatorError>;

    /// Appends one entry to the durable `failed_cleanups` log: a chunk or
    /// item whose compensation failed and needs out-of-band reconciliation.
    async fn log_failed_cleanup(&self, saga_id: &SagaId, native_key: &str, error: &str) -> Result<(), CoordinatorError>;

    /// Appends one entry to the durable `critical_failures` log: a
    /// compensation that itself failed (spec §4.5 step 4, §7).
    async fn log_critical_failure(&self, saga_id: &SagaId, step_name: &str, native_keys: &[String], error: &str) -> Result<(), CoordinatorError>;
}
