// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Service
//!
//! Prometheus-backed counters/histograms for cache hit rate, saga step
//! durations, and compensation counts, mirroring the teacher's
//! `MetricsService` structure (a `Registry` plus named metric fields,
//! each registered individually with a mapped error). Exposed for scraping
//! via [`MetricsService::render`] but not wired to a network listener — no
//! HTTP facade is in scope.

use std::time::Duration;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

use polystore_domain::CoordinatorError;

pub struct MetricsService {
    registry: Registry,
    cache_hits_total: IntCounter,
    cache_misses_total: IntCounter,
    cache_evictions_total: IntCounter,
    saga_step_duration: Histogram,
    saga_completed_total: IntCounter,
    saga_rolled_back_total: IntCounter,
    saga_partial_failure_total: IntCounter,
    compensation_failures_total: IntCounter,
    adapter_errors_total: IntCounterVec,
}

impl MetricsService {
    pub fn new(namespace: &str) -> Result<Self, CoordinatorError> {
        let registry = Registry::new();

        let cache_hits_total = IntCounter::with_opts(
            Opts::new("cache_hits_total", "Total read-cache hits").namespace(namespace),
        )
        .map_err(metrics_err("cache_hits_total"))?;

        let cache_misses_total = IntCounter::with_opts(
            Opts::new("cache_misses_total", "Total read-cache misses").namespace(namespace),
        )
        .map_err(metrics_err("cache_misses_total"))?;

        let cache_evictions_total = IntCounter::with_opts(
            Opts::new("cache_evictions_total", "Total read-cache evictions").namespace(namespace),
        )
        .map_err(metrics_err("cache_evictions_total"))?;

        let saga_step_duration = Histogram::with_opts(
            HistogramOpts::new("saga_step_duration_seconds", "Saga step execution duration").namespace(namespace),
        )
        .map_err(metrics_err("saga_step_duration_seconds"))?;

        let saga_completed_total = IntCounter::with_opts(
            Opts::new("saga_completed_total", "Total sagas that reached Completed").namespace(namespace),
        )
        .map_err(metrics_err("saga_completed_total"))?;

        let saga_rolled_back_total = IntCounter::with_opts(
            Opts::new("saga_rolled_back_total", "Total sagas that reached RolledBack").namespace(namespace),
        )
        .map_err(metrics_err("saga_rolled_back_total"))?;

        let saga_partial_failure_total = IntCounter::with_opts(
            Opts::new("saga_partial_failure_total", "Total sagas that reached PartialFailure").namespace(namespace),
        )
        .map_err(metrics_err("saga_partial_failure_total"))?;

        let compensation_failures_total = IntCounter::with_opts(
            Opts::new("compensation_failures_total", "Total compensations that themselves failed").namespace(namespace),
        )
        .map_err(metrics_err("compensation_failures_total"))?;

        let adapter_errors_total = IntCounterVec::new(
            Opts::new("adapter_errors_total", "Total adapter errors by backend kind and error kind").namespace(namespace),
            &["backend", "kind"],
        )
        .map_err(metrics_err("adapter_errors_total"))?;

        registry
            .register(Box::new(cache_hits_total.clone()))
            .map_err(metrics_err("cache_hits_total"))?;
        registry
            .register(Box::new(cache_misses_total.clone()))
            .map_err(metrics_err("cache_misses_total"))?;
        registry
            .register(Box::new(cache_evictions_total.clone()))
            .map_err(metrics_err("cache_evictions_total"))?;
        registry
            .register(Box::new(saga_step_duration.clone()))
            .map_err(metrics_err("saga_step_duration_seconds"))?;
        registry
            .register(Box::new(saga_completed_total.clone()))
            .map_err(metrics_err("saga_completed_total"))?;
        registry
            .register(Box::new(saga_rolled_back_total.clone()))
            .map_err(metrics_err("saga_rolled_back_total"))?;
        registry
            .register(Box::new(saga_partial_failure_total.clone()))
            .map_err(metrics_err("saga_partial_failure_total"))?;
        registry
            .register(Box::new(compensation_failures_total.clone()))
            .map_err(metrics_err("compensation_failures_total"))?;
        registry
            .register(Box::new(adapter_errors_total.clone()))
            .map_err(metrics_err("adapter_errors_total"))?;

        Ok(Self {
            registry,
            cache_hits_total,
            cache_misses_total,
            cache_evictions_total,
            saga_step_duration,
            saga_completed_total,
            saga_rolled_back_total,
            saga_partial_failure_total,
            compensation_failures_total,
            adapter_errors_total,
        })
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits_total.inc();
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses_total.inc();
    }

    pub fn record_cache_eviction(&self) {
        self.cache_evictions_total.inc();
    }

    pub fn record_saga_step_duration(&self, duration: Duration) {
        self.saga_step_duration.observe(duration.as_secs_f64());
    }

    pub fn record_saga_completed(&self) {
        self.saga_completed_total.inc();
    }

    pub fn record_saga_rolled_back(&self) {
        self.saga_rolled_back_total.inc();
    }

    pub fn record_saga_partial_failure(&self) {
        self.saga_partial_failure_total.inc();
    }

    pub fn record_compensation_failure(&self) {
        self.compensation_failures_total.inc();
    }

    pub fn record_adapter_error(&self, backend: &str, kind: &str) {
        self.adapter_errors_total.with_label_values(&[backend, kind]).inc();
    }

    /// Renders all registered metrics in the Prometheus text exposition
    /// format, for an out-of-process scraper to pull.
    pub fn render(&self) -> Result<String, CoordinatorError> {
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .map_err(|e| CoordinatorError::InternalError(format!("failed to encode metrics: {e}")))
    }
}

fn metrics_err(metric: &'static str) -> impl Fn(prometheus::Error) -> CoordinatorError {
    move |e| CoordinatorError::InternalError(format!("failed to register metric {metric}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_and_render() {
        let service = MetricsService::new("polystore_test").unwrap();
        service.record_cache_hit();
        service.record_cache_miss();
        service.record_adapter_error("document", "transient");

        let rendered = service.render().unwrap();
        assert!(rendered.contains("polystore_test_cache_hits_total 1"));
        assert!(rendered.contains("polystore_test_adapter_errors_total"));
    }
}
