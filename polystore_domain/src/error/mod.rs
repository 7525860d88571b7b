//! Domain error system.
//!
//! Mirrors the error taxonomy the coordinator is built around: a
//! `CoordinatorError` for domain/application-level failures, and a narrower
//! `AdapterErrorKind` that every backend adapter returns so the saga
//! coordinator can make retry/compensation decisions without inspecting
//! opaque strings.

mod adapter_error;
mod coordinator_error;

pub use adapter_error::{AdapterError, AdapterErrorKind};
pub use coordinator_error::CoordinatorError;
