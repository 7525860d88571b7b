// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Background TTL sweeper, grounded on the teacher's supervised-task
//! spawning pattern. Runs until cancelled; never panics the process on a
//! sweep error since sweeping is best-effort housekeeping, not a correctness
//! requirement (correctness comes from lazy TTL checks on `get`).

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::infrastructure::runtime::CancellationToken;

use super::document_cache::DocumentCache;

pub async fn run(cache: Arc<DocumentCache>, interval: Duration, cancellation: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let swept = cache.sweep_expired();
                if swept > 0 {
                    debug!(swept, "cache sweeper removed expired entries");
                }
            }
            _ = cancellation.cancelled() => {
                debug!("cache sweeper shutting down");
                break;
            }
        }
    }
}
