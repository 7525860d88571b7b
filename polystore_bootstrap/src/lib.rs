// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

//! # Bootstrap
//!
//! Sits outside the domain/application/infrastructure layers and owns:
//!
//! - **Entry point** — process lifecycle, wired by `polystore`'s `main.rs`.
//! - **CLI** — secure argument parsing ([`cli`]).
//! - **Signal handling** — graceful shutdown on SIGTERM/SIGINT/SIGHUP ([`signals`]).
//! - **Platform abstraction** — CPU count / temp dir for picking defaults ([`platform`]).
//! - **Exit codes** — BSD `sysexits.h` mapping from `CoordinatorError` ([`exit_code`]).
//! - **Bootstrap config** — the handful of settings resolved before the
//!   coordinator's own layered config is loaded ([`config`]).
//!
//! Enterprise layers (domain, application, infrastructure) never depend on
//! this crate; the dependency only flows one way, from here down.

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod platform;
pub mod signals;

pub use cli::{parse_cli, Cli, Commands};
pub use config::AppConfig;
pub use exit_code::ExitCode;
pub use platform::{create_platform, Platform, PlatformError};
pub use signals::{create_signal_handler, SystemSignals};
