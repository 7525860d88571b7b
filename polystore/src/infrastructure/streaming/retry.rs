// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Exponential backoff with jitter, shared by per-chunk upload retries (spec
//! §4.4) and saga step retries (spec §4.5). A single retryable operation
//! shape keeps both call sites identical rather than duplicating the loop.

use std::future::Future;
use std::time::Duration;

use polystore_domain::error::AdapterError;

use crate::infrastructure::config::RetryPolicy;
use crate::infrastructure::runtime::CancellationToken;

/// Retries `operation` up to `policy.max_attempts` times while its error is
/// retryable, sleeping an exponentially increasing, jittered delay between
/// attempts. Attempt numbers passed to `operation` start at 1. Stops early
/// (returning the last error) if `cancellation` fires mid-backoff.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    cancellation: &CancellationToken,
    mut operation: F,
) -> Result<T, AdapterError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    let mut attempt: u32 = 1;
    let mut delay_seconds = policy.initial_delay_seconds.max(0.0);

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_attempts && error.is_retryable() => {
                let jitter = delay_seconds * policy.jitter_fraction * rand::random::<f64>();
                let sleep = Duration::from_secs_f64((delay_seconds + jitter).max(0.0));

                tokio::select! {
                    _ = tokio::time::sleep(sleep) => {}
                    _ = cancellation.cancelled() => return Err(error),
                }

                attempt += 1;
                delay_seconds *= policy.multiplier.max(1.0);
            }
            Err(error) => return Err(error),
        }
    }
}
