// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! OS abstraction used by the bootstrap composition root to pick sane
//! defaults (saga concurrency ceiling, default data directory) without
//! spreading `#[cfg(unix)]` through the application layer.

use std::path::PathBuf;

mod unix;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("platform operation not supported: {0}")]
    NotSupported(String),
    #[error("platform error: {0}")]
    Other(String),
}

/// Platform-specific facts the bootstrap layer needs to pick defaults.
pub trait Platform: Send + Sync {
    /// Number of logical CPUs, used to size the saga concurrency semaphore
    /// when `saga.max_concurrent_sagas` isn't configured explicitly.
    fn cpu_count(&self) -> usize;

    /// Directory for scratch files (streaming upload staging, temp chunks).
    fn temp_dir(&self) -> PathBuf;

    fn platform_name(&self) -> &'static str;
}

pub fn create_platform() -> Box<dyn Platform> {
    #[cfg(unix)]
    {
        Box::new(unix::UnixPlatform::new())
    }

    #[cfg(not(unix))]
    {
        compile_error!("polystore-bootstrap currently supports unix platforms only");
    }
}
