//! Per-execution variable store with publish/subscribe resolution.
//!
//! The store maps variable names to resolved values and keeps a registry of
//! pending waiters per not-yet-published name. A waiter is a one-shot,
//! single-value handoff channel: it receives the value exactly once if the
//! name is ever published, and deregisters itself on timeout or
//! cancellation.
//!
//! The lifetime of a store is exactly one program execution; it is dropped
//! afterward and never shared across executions.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;

struct Waiter {
    id: u64,
    tx: oneshot::Sender<i64>,
}

#[derive(Default)]
struct StoreInner {
    values: HashMap<String, i64>,
    waiters: HashMap<String, Vec<Waiter>>,
    next_waiter_id: u64,
}

/// Thread-safe variable store for one execution.
///
/// Resolved values are read-mostly, so reads take the read half of the lock;
/// the check-then-register step of [`VarStore::resolve`] and the whole of
/// [`VarStore::publish`] run under the write half, which closes the window
/// where a publish could slip between the miss check and the waiter
/// registration.
#[derive(Default)]
pub struct VarStore {
    inner: RwLock<StoreInner>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain the value of `name`, blocking until it is published.
    ///
    /// Returns immediately if the value is already known. Otherwise registers
    /// a waiter and suspends until the value arrives, the `timeout` elapses
    /// (`UnresolvedVariable`), or `cancel` fires (`Cancelled`).
    pub async fn resolve(
        &self,
        name: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<i64, EngineError> {
        if let Some(value) = self.inner.read().unwrap().values.get(name) {
            return Ok(*value);
        }

        let (id, rx) = {
            let mut inner = self.inner.write().unwrap();
            // Re-check under the write lock: a publish may have landed since
            // the read above.
            if let Some(value) = inner.values.get(name) {
                return Ok(*value);
            }
            let (tx, rx) = oneshot::channel();
            let id = inner.next_waiter_id;
            inner.next_waiter_id += 1;
            inner
                .waiters
                .entry(name.to_string())
                .or_default()
                .push(Waiter { id, tx });
            (id, rx)
        };

        tokio::select! {
            received = rx => {
                // The sender is only dropped if the store itself is torn
                // down mid-wait; treat that like a dependency that never
                // resolved.
                received.map_err(|_| EngineError::unresolved_variable(name))
            }
            _ = tokio::time::sleep(timeout) => {
                self.remove_waiter(name, id);
                Err(EngineError::unresolved_variable(name))
            }
            _ = cancel.cancelled() => {
                self.remove_waiter(name, id);
                Err(EngineError::Cancelled)
            }
        }
    }

    /// Bind `value` to `name` and wake every pending waiter for it.
    ///
    /// A name may be published at most once per execution; a second publish
    /// fails with `DuplicateAssignment` and leaves the store unchanged.
    pub fn publish(&self, name: &str, value: i64) -> Result<(), EngineError> {
        let drained = {
            let mut inner = self.inner.write().unwrap();
            if inner.values.contains_key(name) {
                return Err(EngineError::duplicate_assignment(name));
            }
            inner.values.insert(name.to_string(), value);
            inner.waiters.remove(name).unwrap_or_default()
        };

        // The value is visible before any wakeup, so waiters registering
        // from here on take the immediate read path instead. A send failure
        // means that waiter already timed out or was cancelled.
        for waiter in drained {
            let _ = waiter.tx.send(value);
        }
        Ok(())
    }

    /// Current value of `name`, if already published. Non-blocking.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.inner.read().unwrap().values.get(name).copied()
    }

    fn remove_waiter(&self, name: &str, id: u64) {
        let mut inner = self.inner.write().unwrap();
        if let Some(waiters) = inner.waiters.get_mut(name) {
            waiters.retain(|w| w.id != id);
            if waiters.is_empty() {
                inner.waiters.remove(name);
            }
        }
    }

    #[cfg(test)]
    fn pending_waiters(&self, name: &str) -> usize {
        self.inner
            .read()
            .unwrap()
            .waiters
            .get(name)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn test_resolve_after_publish() {
        let store = VarStore::new();
        store.publish("x", 42).unwrap();

        let cancel = CancellationToken::new();
        let value = store.resolve("x", TIMEOUT, &cancel).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_resolve_blocks_until_publish() {
        let store = Arc::new(VarStore::new());
        let cancel = CancellationToken::new();

        let waiter = {
            let store = Arc::clone(&store);
            let cancel = cancel.clone();
            tokio::spawn(async move { store.resolve("y", TIMEOUT, &cancel).await })
        };

        // Let the waiter register before publishing.
        tokio::task::yield_now().await;
        store.publish("y", 100).unwrap();

        assert_eq!(waiter.await.unwrap().unwrap(), 100);
    }

    #[tokio::test]
    async fn test_publish_wakes_all_waiters() {
        let store = Arc::new(VarStore::new());
        let cancel = CancellationToken::new();

        let mut waiters = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let cancel = cancel.clone();
            waiters.push(tokio::spawn(async move {
                store.resolve("z", TIMEOUT, &cancel).await
            }));
        }

        tokio::task::yield_now().await;
        store.publish("z", 7).unwrap();

        for waiter in waiters {
            assert_eq!(waiter.await.unwrap().unwrap(), 7);
        }
        assert_eq!(store.pending_waiters("z"), 0);
    }

    #[tokio::test]
    async fn test_duplicate_publish_fails_and_keeps_first_value() {
        let store = VarStore::new();
        store.publish("x", 1).unwrap();

        let err = store.publish("x", 2).unwrap_err();
        assert_eq!(err, EngineError::DuplicateAssignment("x".to_string()));
        assert_eq!(store.get("x"), Some(1));
    }

    #[tokio::test]
    async fn test_resolve_times_out_on_missing_variable() {
        let store = VarStore::new();
        let cancel = CancellationToken::new();

        let err = store
            .resolve("ghost", Duration::from_millis(50), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::UnresolvedVariable("ghost".to_string()));
        assert_eq!(store.pending_waiters("ghost"), 0);
    }

    #[tokio::test]
    async fn test_resolve_unblocks_on_cancellation() {
        let store = Arc::new(VarStore::new());
        let cancel = CancellationToken::new();

        let waiter = {
            let store = Arc::clone(&store);
            let cancel = cancel.clone();
            tokio::spawn(async move { store.resolve("w", TIMEOUT, &cancel).await })
        };

        tokio::task::yield_now().await;
        cancel.cancel();

        assert_eq!(waiter.await.unwrap().unwrap_err(), EngineError::Cancelled);
        assert_eq!(store.pending_waiters("w"), 0);
    }

    #[tokio::test]
    async fn test_get_is_non_blocking() {
        let store = VarStore::new();
        assert_eq!(store.get("x"), None);
        store.publish("x", 5).unwrap();
        assert_eq!(store.get("x"), Some(5));
    }
}
