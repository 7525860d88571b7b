// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Adapter Error Taxonomy
//!
//! Every backend adapter (relational, document, vector, graph) surfaces
//! errors through this taxonomy rather than opaque strings, so the saga
//! coordinator can decide whether to retry, compensate, or surface to the
//! caller (spec §4.1, §7).

use std::fmt;

/// Category of an adapter-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterErrorKind {
    /// Safe to retry with backoff.
    Transient,
    /// Must not be retried; triggers rollback.
    Permanent,
    /// Surfaced on reads; not a saga failure.
    NotFound,
    /// Duplicate key or version mismatch; treated as `Permanent` unless the
    /// step is explicitly idempotent-on-conflict.
    Conflict,
    /// Hash/size/count mismatch; never retried, always triggers rollback.
    Integrity,
    /// Retry with delay; the backend is overloaded rather than broken.
    Backpressure,
}

/// A taxonomized error returned by a [`crate::services::Adapter`] operation.
#[derive(Debug, Clone)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub message: String,
}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Transient, message)
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Permanent, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Conflict, message)
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Integrity, message)
    }

    pub fn backpressure(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Backpressure, message)
    }

    /// Per spec §4.1: "all other exceptions are treated as PERMANENT."
    pub fn from_unexpected(err: impl fmt::Display) -> Self {
        Self::permanent(err.to_string())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, AdapterErrorKind::Transient | AdapterErrorKind::Backpressure)
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for AdapterError {}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => AdapterError::not_found(err.to_string()),
            ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
                AdapterError::transient(err.to_string())
            }
            _ => AdapterError::permanent(err.to_string()),
        }
    }
}
