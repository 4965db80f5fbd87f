//! Per-key async locks for the in-memory stores.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockTable = DashMap<Uuid, Arc<Mutex<()>>>;

/// A table of mutexes, one per resource id, created on first use and
/// dropped once nobody holds or waits for it.
///
/// Holding the guard for one key never blocks callers of another key.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Arc<LockTable>,
}

/// Exclusive access to one key. Dropping it releases the key.
#[derive(Debug)]
pub struct KeyedGuard {
    table: Arc<LockTable>,
    key: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold a clone of the Arc, so a count of one means idle.
        // The check runs under the shard lock that `lock` takes to clone.
        self.table
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl KeyedLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: Uuid) -> KeyedGuard {
        // Clone the Arc out so the shard guard is released before awaiting.
        let mutex = self.locks.entry(key).or_default().value().clone();
        let guard = mutex.lock_owned().await;
        KeyedGuard {
            table: Arc::clone(&self.locks),
            key,
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key is held or awaited.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks = Arc::new(KeyedLocks::new());
        let key = Uuid::new_v4();
        let guard = locks.lock(key).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.lock(key).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_contend() {
        let locks = KeyedLocks::new();
        let _a = locks.lock(Uuid::new_v4()).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock(Uuid::new_v4())).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_released_keys_are_pruned() {
        let locks = KeyedLocks::new();
        for _ in 0..10 {
            let _g = locks.lock(Uuid::new_v4()).await;
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_key_with_waiter_survives_release() {
        let locks = Arc::new(KeyedLocks::new());
        let key = Uuid::new_v4();
        let guard = locks.lock(key).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.lock(key).await;
                locks.len()
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        // The waiter still found its entry after the first holder left.
        assert_eq!(waiter.await.unwrap(), 1);
        assert!(locks.is_empty());
    }
}
