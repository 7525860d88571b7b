// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Saga Engine
//!
//! Executes a [`SagaDefinition`] (spec §4.5): persists the running record
//! before any forward step, runs steps sequentially with per-step retry,
//! stops before any step after a failed `IntegrityGate`, and rolls back
//! completed steps best-effort on failure. Concurrency across sagas is
//! bounded by a `tokio::sync::Semaphore` (spec §5); cancellation and
//! deadlines are enforced with `tokio::time::timeout` and the cooperative
//! `CancellationToken`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use polystore_domain::entities::{SagaExecutionRecord, SagaStatus, StepStatus};
use polystore_domain::error::CoordinatorError;
use polystore_domain::repositories::SagaLog;
use polystore_domain::value_objects::{DocumentId, SagaId};

use crate::infrastructure::config::{RetryPolicy, SagaSettings};
use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::runtime::CancellationToken;
use crate::infrastructure::streaming::retry_with_backoff;

use super::step::{SagaDefinition, StepContext};

pub struct SagaEngine {
    saga_log: Arc<dyn SagaLog>,
    metrics: Arc<MetricsService>,
    settings: SagaSettings,
    concurrency: Arc<Semaphore>,
}

impl SagaEngine {
    pub fn new(saga_log: Arc<dyn SagaLog>, metrics: Arc<MetricsService>, settings: SagaSettings) -> Self {
        let concurrency = Arc::new(Semaphore::new(settings.max_concurrent_sagas.max(1)));
        Self { saga_log, metrics, settings, concurrency }
    }

    /// Runs `definition` to completion against a freshly minted saga id,
    /// returning the final [`SagaExecutionRecord`]. Acquires a concurrency
    /// permit first — excess requests queue rather than running unbounded
    /// (spec §5).
    pub async fn run(&self, document_id: DocumentId, definition: SagaDefinition, cancellation: CancellationToken) -> Result<SagaExecutionRecord, CoordinatorError> {
        self.run_saga(SagaId::new(), document_id, definition, cancellation).await
    }

    /// Runs `definition` against a caller-supplied saga id, resuming a prior
    /// incomplete run rather than starting over (spec §4.5, §8 testable
    /// property 3: "re-running a crashed saga with the same saga id replays
    /// only those steps not marked completed"). If no `Running` record is
    /// found under `saga_id` this behaves exactly like [`Self::run`], except
    /// the minted record uses `saga_id` instead of a random one.
    pub async fn resume(&self, saga_id: SagaId, document_id: DocumentId, definition: SagaDefinition, cancellation: CancellationToken) -> Result<SagaExecutionRecord, CoordinatorError> {
        self.run_saga(saga_id, document_id, definition, cancellation).await
    }

    async fn run_saga(&self, saga_id: SagaId, document_id: DocumentId, definition: SagaDefinition, cancellation: CancellationToken) -> Result<SagaExecutionRecord, CoordinatorError> {
        let _permit = self
            .concurrency
            .acquire()
            .await
            .map_err(|e| CoordinatorError::internal(format!("saga concurrency semaphore closed: {e}")))?;

        let step_names = definition.step_names();
        let mut record = match self.saga_log.load(&saga_id).await? {
            Some(existing) if existing.status == SagaStatus::Running => existing,
            _ => SagaExecutionRecord::new_with_id(saga_id, document_id, &step_names),
        };
        self.saga_log.persist(&record).await?;

        let outputs = Arc::new(Mutex::new(BTreeMap::new()));
        // native keys produced by each completed step (this run or a prior,
        // crashed one), for rollback.
        let mut completed_native_keys: Vec<(&'static str, Vec<String>)> = record
            .completed_steps()
            .filter_map(|outcome| definition.iter().find(|s| s.name == outcome.step_name).map(|s| (s.name, outcome.native_keys.clone())))
            .collect();
        let mut step_failed = false;

        // A single deadline for the whole saga (spec §5); each step gets
        // whatever's left of the budget, so the deadline can expire mid-step
        // without needing to interrupt an in-flight forward call directly.
        let deadline_at = self.settings.deadline_seconds.map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));

        for step in definition.iter() {
            if step_failed {
                break;
            }

            let Some(current) = record.step_mut(step.name) else {
                return Err(CoordinatorError::internal(format!("step {} missing from its own saga record", step.name)));
            };
            if current.status == StepStatus::Completed {
                // Already ran to completion in a prior, crashed attempt at
                // this same saga id — resuming must not replay it.
                continue;
            }
            current.status = StepStatus::Running;
            record.touch();
            self.saga_log.persist(&record).await?;

            let idempotency_key = step.idempotency_key(&document_id);
            let ctx = StepContext { document_id, saga_id, cancellation: cancellation.clone(), outputs: outputs.clone(), idempotency_key };
            let policy = step.retry_policy.clone().unwrap_or(RetryPolicy { max_attempts: 1, initial_delay_seconds: 0.0, multiplier: 1.0, jitter_fraction: 0.0 });

            let forward = step.forward.clone();
            let attempts = Arc::new(std::sync::atomic::AtomicU32::new(0));

            let run_forward = {
                let attempts = attempts.clone();
                retry_with_backoff(&policy, &cancellation, move |attempt| {
                    attempts.store(attempt, std::sync::atomic::Ordering::Relaxed);
                    let ctx = ctx.clone();
                    let forward = forward.clone();
                    async move { forward(ctx).await }
                })
            };

            let remaining = deadline_at.map(|at| at.saturating_duration_since(tokio::time::Instant::now()));
            let outcome = match remaining {
                Some(remaining) if remaining.is_zero() => {
                    Err(polystore_domain::error::AdapterError::permanent(format!("saga deadline exceeded before step {}", step.name)))
                }
                Some(remaining) => match tokio::time::timeout(remaining, run_forward).await {
                    Ok(result) => result,
                    Err(_) => Err(polystore_domain::error::AdapterError::permanent(format!("saga deadline exceeded during step {}", step.name))),
                },
                None => run_forward.await,
            };

            let Some(step_record) = record.step_mut(step.name) else {
                return Err(CoordinatorError::internal(format!("step {} missing from its own saga record", step.name)));
            };
            step_record.attempts = attempts.load(std::sync::atomic::Ordering::Relaxed).max(1);

            match outcome {
                Ok(native_keys) => {
                    step_record.status = StepStatus::Completed;
                    step_record.native_keys = native_keys.clone();
                    step_record.finished_at = Some(chrono::Utc::now());
                    record.touch();
                    self.saga_log.persist(&record).await?;
                    completed_native_keys.push((step.name, native_keys));

                    if step.is_integrity_gate {
                        info!(saga_id = %saga_id, step = step.name, "integrity gate passed");
                    }
                }
                Err(error) => {
                    warn!(saga_id = %saga_id, step = step.name, error = %error, "saga step failed");
                    step_record.status = StepStatus::Failed;
                    step_record.last_error = Some(error.to_string());
                    step_record.finished_at = Some(chrono::Utc::now());
                    record.touch();
                    self.saga_log.persist(&record).await?;
                    step_failed = true;
                }
            }
        }

        let final_status = if step_failed {
            self.roll_back(&mut record, &definition, &completed_native_keys, &cancellation, &outputs).await
        } else {
            SagaStatus::Completed
        };

        record.finalize(final_status);
        self.saga_log.persist(&record).await?;
        match final_status {
            SagaStatus::Completed => self.metrics.record_saga_completed(),
            SagaStatus::RolledBack => self.metrics.record_saga_rolled_back(),
            SagaStatus::PartialFailure => self.metrics.record_saga_partial_failure(),
            _ => {}
        }

        Ok(record)
    }

    /// Compensates every completed step in reverse order (spec §4.5 step 4).
    /// Best-effort: a failing compensation is logged to `critical_failures`
    /// and the remaining compensations still run.
    async fn roll_back(
        &self,
        record: &mut SagaExecutionRecord,
        definition: &SagaDefinition,
        completed_native_keys: &[(&'static str, Vec<String>)],
        cancellation: &CancellationToken,
        outputs: &super::step::StepOutputs,
    ) -> SagaStatus {
        let mut any_compensation_failed = false;

        for (step_name, native_keys) in completed_native_keys.iter().rev() {
            let Some(step) = definition.iter().find(|s| s.name == *step_name) else { continue };

            let idempotency_key = step.idempotency_key(&record.document_id);
            let ctx = StepContext { document_id: record.document_id, saga_id: record.saga_id, cancellation: cancellation.clone(), outputs: outputs.clone(), idempotency_key };
            match (step.compensate)(ctx, native_keys.clone()).await {
                Ok(()) => {
                    record.mark_compensated(step_name, true, None);
                }
                Err(compensation_error) => {
                    any_compensation_failed = true;
                    record.mark_compensated(step_name, false, Some(compensation_error.message.clone()));

                    for key in &compensation_error.failed_native_keys {
                        let _ = self.saga_log.log_failed_cleanup(&record.saga_id, key, &compensation_error.message).await;
                    }
                    let _ = self
                        .saga_log
                        .log_critical_failure(&record.saga_id, step_name, &compensation_error.failed_native_keys, &compensation_error.message)
                        .await;
                    self.metrics.record_compensation_failure();
                }
            }
        }

        if any_compensation_failed {
            SagaStatus::PartialFailure
        } else {
            SagaStatus::RolledBack
        }
    }
}
