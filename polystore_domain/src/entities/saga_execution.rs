// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Saga Execution Record
//!
//! The durable record of one coordinated write (spec §3, §4.5). Owned and
//! transitioned exclusively by the Saga Coordinator; adapters return native
//! keys into it but never mutate it directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{CorrelationId, DocumentId, SagaId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Compensated,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Compensated | StepStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SagaStatus {
    Running,
    Completed,
    RolledBack,
    PartialFailure,
}

impl SagaStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SagaStatus::Running)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step_name: String,
    pub status: StepStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub native_keys: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl StepOutcome {
    pub fn pending(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::Pending,
            attempts: 0,
            last_error: None,
            native_keys: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaExecutionRecord {
    pub saga_id: SagaId,
    pub document_id: DocumentId,
    pub correlation_id: CorrelationId,
    pub steps: Vec<StepOutcome>,
    pub status: SagaStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SagaExecutionRecord {
    pub fn new(document_id: DocumentId, step_names: &[&str]) -> Self {
        Self::new_with_id(SagaId::new(), document_id, step_names)
    }

    /// Like [`Self::new`], but under a caller-chosen saga id — used to start
    /// (or restart, if nothing was ever persisted) a saga that must be
    /// resumable under a stable id rather than one minted fresh every run.
    pub fn new_with_id(saga_id: SagaId, document_id: DocumentId, step_names: &[&str]) -> Self {
        let now = Utc::now();
        Self {
            saga_id,
            document_id,
            correlation_id: CorrelationId::new(),
            steps: step_names.iter().map(|name| StepOutcome::pending(*name)).collect(),
            status: SagaStatus::Running,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn step_mut(&mut self, step_name: &str) -> Option<&mut StepOutcome> {
        self.steps.iter_mut().find(|s| s.step_name == step_name)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn finalize(&mut self, status: SagaStatus) {
        self.status = status;
        self.touch();
    }

    /// spec §3: "any step with status completed that is later compensated
    /// transitions to compensated; completed steps whose compensation
    /// itself fails are marked failed and logged as critical."
    pub fn mark_compensated(&mut self, step_name: &str, ok: bool, error: Option<String>) {
        if let Some(step) = self.step_mut(step_name) {
            step.status = if ok { StepStatus::Compensated } else { StepStatus::Failed };
            step.last_error = error;
        }
        self.touch();
    }

    pub fn completed_steps(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| s.status == StepStatus::Completed)
    }
}
