// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Coordinator Error System
//!
//! Domain-specific errors for the polyglot-persistence coordinator. Each
//! variant categorizes a specific failure mode so callers can decide whether
//! to retry the whole request or escalate, without inspecting adapter
//! internals (spec §7, "the caller is never required to consult
//! adapter-specific errors directly").

use thiserror::Error;

use crate::error::AdapterErrorKind;

/// Errors surfaced by the domain and application layers.
#[derive(Error, Debug, Clone)]
pub enum CoordinatorError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid chunk: {0}")]
    InvalidChunk(String),

    #[error("invalid relation: {0}")]
    InvalidRelation(String),

    #[error("integrity check failed: {0}")]
    IntegrityError(String),

    #[error("adapter error ({kind:?}): {message}")]
    AdapterFailed { kind: AdapterErrorKind, message: String },

    #[error("saga rollback required: {0}")]
    SagaRollbackRequired(String),

    #[error("compensation failed for step {step}: {message}")]
    CompensationFailed { step: String, message: String },

    #[error("saga deadline exceeded at step {0}")]
    DeadlineExceeded(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("io error: {0}")]
    IoError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl CoordinatorError {
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Whether a caller could plausibly retry the whole request and expect a
    /// different outcome (as opposed to a permanent, structural failure).
    pub fn is_retryable_at_request_level(&self) -> bool {
        matches!(
            self,
            CoordinatorError::AdapterFailed { kind: AdapterErrorKind::Transient, .. }
                | CoordinatorError::AdapterFailed { kind: AdapterErrorKind::Backpressure, .. }
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            CoordinatorError::InvalidConfiguration(_) => "configuration",
            CoordinatorError::InvalidDocument(_) => "document",
            CoordinatorError::InvalidChunk(_) => "chunk",
            CoordinatorError::InvalidRelation(_) => "relation",
            CoordinatorError::IntegrityError(_) => "integrity",
            CoordinatorError::AdapterFailed { .. } => "adapter",
            CoordinatorError::SagaRollbackRequired(_) => "saga",
            CoordinatorError::CompensationFailed { .. } => "compensation",
            CoordinatorError::DeadlineExceeded(_) => "deadline",
            CoordinatorError::NotFound(_) => "not_found",
            CoordinatorError::Conflict(_) => "conflict",
            CoordinatorError::SerializationError(_) => "serialization",
            CoordinatorError::IoError(_) => "io",
            CoordinatorError::InternalError(_) => "internal",
        }
    }
}

impl From<std::io::Error> for CoordinatorError {
    fn from(err: std::io::Error) -> Self {
        CoordinatorError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for CoordinatorError {
    fn from(err: serde_json::Error) -> Self {
        CoordinatorError::SerializationError(err.to_string())
    }
}
