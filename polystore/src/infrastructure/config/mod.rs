// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Coordinator Configuration
//!
//! Layered loading (spec §6): an optional TOML file plus `POLYSTORE__`
//! prefixed environment variable overrides, merged through the `config`
//! crate's builder the way the teacher's `ConfigService` layers
//! `config::Config`. Every knob falls back to the default named in spec §6
//! when the file is absent, matching the teacher's warn-and-default
//! behavior rather than failing startup.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use polystore_domain::CoordinatorError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSettings {
    pub max_size: usize,
    pub default_ttl_seconds: u64,
    pub auto_cleanup_interval_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { max_size: 1000, default_ttl_seconds: 300, auto_cleanup_interval_seconds: 60 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamingSettings {
    pub chunk_size_bytes: usize,
    pub max_attempts_per_chunk: u32,
    pub backoff_initial_seconds: f64,
    pub backoff_multiplier: f64,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self { chunk_size_bytes: 8 * 1024 * 1024, max_attempts_per_chunk: 3, backoff_initial_seconds: 1.0, backoff_multiplier: 2.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_seconds: f64,
    pub multiplier: f64,
    pub jitter_fraction: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, initial_delay_seconds: 1.0, multiplier: 2.0, jitter_fraction: 0.1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SagaSettings {
    pub step_retry_policy: RetryPolicy,
    pub deadline_seconds: Option<u64>,
    pub durable_log_path: Option<String>,
    /// Ceiling on sagas running at once (spec §5, Open Question resolved in DESIGN.md).
    pub max_concurrent_sagas: usize,
}

impl Default for SagaSettings {
    fn default() -> Self {
        Self {
            step_retry_policy: RetryPolicy::default(),
            deadline_seconds: None,
            durable_log_path: None,
            max_concurrent_sagas: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSettings {
    pub namespace: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { namespace: "polystore".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CoordinatorConfig {
    pub cache: CacheSettings,
    pub streaming: StreamingSettings,
    pub saga: SagaSettings,
    pub logging: LoggingSettings,
    pub metrics: MetricsSettings,
}

impl CoordinatorConfig {
    /// Loads configuration the way the teacher's `ConfigService` does:
    /// defaults, overlaid with an optional TOML file, overlaid with
    /// `POLYSTORE__SECTION__KEY`-style environment overrides. A missing file
    /// is not an error — it's logged and defaults are used.
    pub async fn load(config_path: Option<&Path>) -> Result<Self, CoordinatorError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&CoordinatorConfig::default()).map_err(|e| {
                CoordinatorError::InvalidConfiguration(format!("failed to seed config defaults: {e}"))
            })?);

        if let Some(path) = config_path {
            if path.exists() {
                debug!(?path, "loading coordinator config file");
                builder = builder.add_source(config::File::from(path));
            } else {
                warn!(?path, "coordinator config file not found, using defaults");
            }
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("POLYSTORE").separator("__").try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| CoordinatorError::InvalidConfiguration(format!("failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| CoordinatorError::InvalidConfiguration(format!("failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults() {
        let config = CoordinatorConfig::load(Some(Path::new("/nonexistent/polystore.toml"))).await.unwrap();
        assert_eq!(config, CoordinatorConfig::default());
    }

    #[tokio::test]
    async fn no_path_also_falls_back_to_defaults() {
        let config = CoordinatorConfig::load(None).await.unwrap();
        assert_eq!(config.cache.max_size, 1000);
        assert_eq!(config.saga.max_concurrent_sagas, 16);
    }

    #[tokio::test]
    async fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polystore.toml");
        std::fs::write(&path, "[cache]\nmax_size = 42\ndefault_ttl_seconds = 300\nauto_cleanup_interval_seconds = 60\n").unwrap();

        let config = CoordinatorConfig::load(Some(&path)).await.unwrap();
        assert_eq!(config.cache.max_size, 42);
    }

    #[tokio::test]
    async fn env_override_takes_precedence_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polystore.toml");
        std::fs::write(&path, "[cache]\nmax_size = 42\ndefault_ttl_seconds = 300\nauto_cleanup_interval_seconds = 60\n").unwrap();

        std::env::set_var("POLYSTORE__CACHE__MAX_SIZE", "99");
        let config = CoordinatorConfig::load(Some(&path)).await.unwrap();
        std::env::remove_var("POLYSTORE__CACHE__MAX_SIZE");

        assert_eq!(config.cache.max_size, 99);
    }
}
