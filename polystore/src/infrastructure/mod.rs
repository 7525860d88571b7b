// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Infrastructure: concrete implementations of the domain's ports —
//! adapters, cache, streaming pipeline, saga engine, configuration,
//! logging, metrics, and runtime plumbing.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod runtime;
pub mod saga;
pub mod streaming;

pub use config::CoordinatorConfig;
