// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Structured logging initialization, configured once at bootstrap the way
//! the teacher wires `tracing_subscriber::FmtSubscriber` in `main.rs`.

use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::LoggingSettings;

/// Installs the global `tracing` subscriber. Must be called exactly once,
/// before any adapter, cache, or saga code emits events.
pub fn init(settings: &LoggingSettings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_new(&settings.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_accepts_an_invalid_level_without_panicking() {
        let settings = LoggingSettings { level: "not-a-level".to_string(), format: "pretty".to_string() };
        // try_init may fail if a global subscriber is already set by another
        // test in this binary; either outcome is fine, we're only checking
        // it does not panic on a bad filter string.
        let _ = init(&settings);
    }
}
