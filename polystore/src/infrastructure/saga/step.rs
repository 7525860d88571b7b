// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Step Records
//!
//! A Saga Definition is a sequence of homogeneous [`Step`] values rather
//! than a class hierarchy of step subtypes (spec §9: "avoid dynamic
//! dispatch on step subclasses; prefer a homogeneous step record type with
//! function-valued fields"). `forward`/`compensate` are data, not virtual
//! methods — building a different step means constructing a different
//! value of the same type, never defining a new type.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;

use polystore_domain::error::AdapterError;
use polystore_domain::value_objects::{DocumentId, SagaId};

use crate::infrastructure::config::RetryPolicy;
use crate::infrastructure::runtime::CancellationToken;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Side-channel for data that must flow between steps of the same saga
/// without going through an adapter (e.g. the streaming manifest an
/// `IntegrityGate` validates). Keyed by step name.
pub type StepOutputs = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

/// Everything a step's `forward`/`compensate` closures need beyond their own
/// captured state.
#[derive(Clone)]
pub struct StepContext {
    pub document_id: DocumentId,
    pub saga_id: SagaId,
    pub cancellation: CancellationToken,
    pub outputs: StepOutputs,
    /// `(document_id, step_name)` derived (spec §4.5 Idempotency), stable
    /// across a replay that resumes the same saga id — unlike `saga_id`
    /// itself, which a fresh run always mints anew.
    pub idempotency_key: String,
}

/// Produces the native key(s) the forward call wrote (empty for a
/// non-mutating step such as `IntegrityGate`).
pub type ForwardFn = Arc<dyn Fn(StepContext) -> BoxFuture<'static, Result<Vec<String>, AdapterError>> + Send + Sync>;

/// Receives the native keys `forward` produced (empty if the step never
/// reached a successful forward call). Must be idempotent and a safe no-op
/// when called on a step that never ran.
pub type CompensateFn = Arc<dyn Fn(StepContext, Vec<String>) -> BoxFuture<'static, Result<(), CompensationError>> + Send + Sync>;

/// A compensation that only partially succeeded: the keys in
/// `failed_native_keys` still require out-of-band reconciliation (spec
/// §4.5 step 4, §7 `COMPENSATION_FAILED`).
#[derive(Debug, Clone)]
pub struct CompensationError {
    pub message: String,
    pub failed_native_keys: Vec<String>,
}

impl CompensationError {
    pub fn new(message: impl Into<String>, failed_native_keys: Vec<String>) -> Self {
        Self { message: message.into(), failed_native_keys }
    }
}

/// One forward/compensate pair targeting a single adapter (spec §4.5).
#[derive(Clone)]
pub struct Step {
    pub name: &'static str,
    /// A critical step's failure is never itself retried beyond its own
    /// retry policy before rollback begins; reserved for steps whose partial
    /// effect is especially costly to leave dangling.
    pub critical: bool,
    /// Non-mutating; forbids any subsequent step from running on failure
    /// (spec §4.5 step 3).
    pub is_integrity_gate: bool,
    /// `None` uses the saga-level default policy.
    pub retry_policy: Option<RetryPolicy>,
    pub forward: ForwardFn,
    pub compensate: CompensateFn,
}

impl Step {
    pub fn idempotency_key(&self, document_id: &DocumentId) -> String {
        format!("{document_id}:{}", self.name)
    }
}

/// An ordered sequence of steps (spec §4.5). A thin newtype rather than a
/// bare `Vec` so the engine's API reads as "run this definition", not
/// "run this list".
#[derive(Clone, Default)]
pub struct SagaDefinition {
    steps: Vec<Step>,
}

impl SagaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
