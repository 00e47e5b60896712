//! Per-key append serialization
//!
//! Extending a chain is a read-modify-write: read the current tail, hash
//! against it, insert the new record. Two concurrent appends to the same
//! chain must not both observe the same tail, or history forks. This
//! module provides the explicit serialization boundary: one async mutex
//! per chain key, so appends to different principals or owners never
//! contend with each other.
//!
//! Guards are held across the storage await points of a single append and
//! nowhere else. Read paths (verification, walking) never take these
//! locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A table of named async mutexes, created on first use.
///
/// Lock entries are never removed; the set of live chain keys in one
/// process stays small relative to the records behind them.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting behind any holder of the same
    /// key. Holders of other keys proceed independently.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.inner.lock().unwrap();
            Arc::clone(
                table
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks = Arc::new(KeyedLocks::new());
        let in_section = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let in_section = Arc::clone(&in_section);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("u1").await;
                let now = in_section.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_section.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_contend() {
        let locks = Arc::new(KeyedLocks::new());

        let guard_a = locks.acquire("u1").await;
        // A second key must be immediately acquirable while u1 is held.
        let guard_b = tokio::time::timeout(Duration::from_millis(50), locks.acquire("u2"))
            .await
            .expect("u2 must not wait behind u1");

        drop(guard_a);
        drop(guard_b);
    }
}
