// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

//! # Polystore Coordinator
//!
//! A saga-coordinated polyglot-persistence writer: a single document write
//! fans out across a relational metadata store, a document/blob store, a
//! vector store, and a graph store, with forward/compensate steps so a
//! mid-write failure leaves no backend holding a partial write. Reads are
//! served through an LRU+TTL cache in front of a multi-backend fan-out.
//!
//! Layered the way the teacher's pipeline crate is layered:
//!
//! - [`application`] — the `Coordinator` facade and its request/response types.
//! - [`infrastructure`] — adapters, cache, saga engine, streaming, config,
//!   metrics, and logging: everything the application layer wires together.
//!
//! The `polystore-bootstrap` crate owns process lifecycle (CLI parsing,
//! signal handling, exit codes) and never appears below this layer.

pub mod application;
pub mod infrastructure;

pub use application::{Coordinator, DeleteOptions, ReadOptions, SagaResult, WriteRequest};
