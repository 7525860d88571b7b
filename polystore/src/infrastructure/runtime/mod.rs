// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Runtime Utilities
//!
//! Supervised task spawning (no spawn-and-forget) and an explicit,
//! exception-free cancellation signal passed through step and adapter calls
//! (spec §9: "cancellation tokens, never exceptions").

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use polystore_domain::CoordinatorError;

pub type AppResult<T> = Result<T, CoordinatorError>;

/// Wraps `tokio::spawn` with start/success/failure logging so a background
/// task (the cache sweeper, the saga log writer) never fails silently.
pub fn spawn_supervised<F, T>(name: &'static str, fut: F) -> JoinHandle<AppResult<T>>
where
    F: Future<Output = AppResult<T>> + Send + 'static,
    T: Send + 'static,
{
    debug!(task = name, "task starting");

    tokio::spawn(async move {
        let result = fut.await;
        match &result {
            Ok(_) => debug!(task = name, "task completed"),
            Err(e) => error!(task = name, error = %e, "task failed"),
        }
        result
    })
}

/// Awaits a supervised task, converting panics/cancellation into a typed
/// error rather than propagating a `JoinError`.
pub async fn join_supervised<T>(handle: JoinHandle<AppResult<T>>) -> AppResult<T> {
    match handle.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(CoordinatorError::internal(format!("task panicked: {e}"))),
        Err(e) if e.is_cancelled() => Err(CoordinatorError::internal("task was cancelled")),
        Err(e) => Err(CoordinatorError::internal(format!("task join failed: {e}"))),
    }
}

/// A cooperative cancellation signal: an `AtomicBool` flag plus a `Notify`
/// so awaiting tasks wake promptly instead of polling. Cloning shares the
/// same underlying signal.
#[derive(Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)), notify: Arc::new(Notify::new()) }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called. A loop so a waiter that
    /// starts after cancellation still observes it immediately.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            self.notify.notified().await;
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn supervised_task_propagates_its_result() {
        let handle = spawn_supervised("test-ok", async { Ok(42) });
        assert_eq!(join_supervised(handle).await.unwrap(), 42);

        let handle = spawn_supervised::<_, ()>("test-err", async {
            Err(CoordinatorError::internal("boom"))
        });
        assert!(join_supervised(handle).await.is_err());
    }

    #[tokio::test]
    async fn cancellation_token_wakes_a_waiting_task() {
        let token = CancellationToken::new();
        let waiter_token = token.clone();
        let waiter = tokio::spawn(async move {
            waiter_token.cancelled().await;
        });

        assert!(!token.is_cancelled());
        token.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn already_cancelled_token_resolves_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        tokio::time::timeout(std::time::Duration::from_millis(100), token.cancelled()).await.unwrap();
    }
}
