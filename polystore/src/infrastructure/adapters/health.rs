// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Lightweight health probing across the configured adapter set, used at
//! coordinator startup and on adapter-emitted `Transient` spikes (spec §6).

use std::sync::Arc;

use polystore_domain::entities::BackendKind;
use polystore_domain::services::{Adapter, Health, HealthStatus};

pub struct HealthProbe {
    adapters: Vec<Arc<dyn Adapter>>,
}

impl HealthProbe {
    pub fn new(adapters: Vec<Arc<dyn Adapter>>) -> Self {
        Self { adapters }
    }

    /// Polls every configured adapter concurrently, returning one
    /// `(BackendKind, Health)` pair each.
    pub async fn check_all(&self) -> Vec<(BackendKind, Health)> {
        let futures = self.adapters.iter().map(|adapter| async move { (adapter.kind(), adapter.health().await) });
        futures::future::join_all(futures).await
    }

    /// `true` only if every adapter reports reachable.
    pub async fn all_reachable(&self) -> bool {
        self.check_all().await.into_iter().all(|(_, health)| health.status == HealthStatus::Reachable)
    }
}
