// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Application layer: the `Coordinator` facade (spec §6) and its request/
//! response types. Everything in `infrastructure` is plumbing this module
//! wires together into the three operations callers actually use.

mod coordinator;
mod requests;

pub use coordinator::Coordinator;
pub use requests::{DeleteOptions, PayloadSource, ReadOptions, RelationInput, SagaResult, VectorInput, WriteOptions, WriteRequest};
