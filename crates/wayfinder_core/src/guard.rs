//! Per-key read/write exclusion.
//!
//! Lock entries are created on first use and evicted as soon as the last holder releases them,
//! so the table only ever contains keys with an operation in flight.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

type LockTable = DashMap<String, Arc<RwLock<()>>>;

#[derive(Debug, Default)]
pub struct KeyedAccessGuard {
    locks: LockTable,
}

impl KeyedAccessGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `op` while holding the shared lock for `key`.
    pub async fn read<F, Fut, T>(&self, key: &str, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let (_lease, lock) = self.lease(key);
        // Locals drop in reverse order, so the lock is released before the lease evicts.
        let _held = lock.read_owned().await;
        op().await
    }

    /// Runs `op` while holding the exclusive lock for `key`.
    pub async fn write<F, Fut, T>(&self, key: &str, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let (_lease, lock) = self.lease(key);
        // Locals drop in reverse order, so the lock is released before the lease evicts.
        let _held = lock.write_owned().await;
        op().await
    }

    /// Number of keys with an operation in flight or waiting.
    pub fn active_keys(&self) -> usize {
        self.locks.len()
    }

    fn lease<'a>(&'a self, key: &'a str) -> (Lease<'a>, Arc<RwLock<()>>) {
        let lock = self.locks.entry(key.to_owned()).or_default().clone();
        let lease = Lease {
            table: &self.locks,
            key,
        };
        (lease, lock)
    }
}

/// Evicts the key's lock entry once nobody else references it.
///
/// A waiter cancelled mid-acquisition can leave its entry behind; the next release on that key
/// evicts it.
struct Lease<'a> {
    table: &'a LockTable,
    key: &'a str,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.table
            .remove_if(self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    #[tokio::test]
    async fn writes_on_distinct_keys_do_not_block() {
        let guard = Arc::new(KeyedAccessGuard::new());
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let holder = {
            let guard = guard.clone();
            tokio::spawn(async move {
                guard
                    .write("a", || async move {
                        entered_tx.send(()).unwrap();
                        release_rx.await.unwrap();
                    })
                    .await;
            })
        };
        entered_rx.await.unwrap();

        let other = timeout(Duration::from_secs(1), guard.write("b", || async { 7 })).await;
        assert_eq!(other.unwrap(), 7);

        release_tx.send(()).unwrap();
        holder.await.unwrap();
    }

    #[tokio::test]
    async fn read_waits_for_write_on_same_key() {
        let guard = Arc::new(KeyedAccessGuard::new());
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let holder = {
            let guard = guard.clone();
            tokio::spawn(async move {
                guard
                    .write("a", || async move {
                        entered_tx.send(()).unwrap();
                        release_rx.await.unwrap();
                    })
                    .await;
            })
        };
        entered_rx.await.unwrap();

        let blocked = timeout(Duration::from_millis(50), guard.read("a", || async {})).await;
        assert!(blocked.is_err());

        release_tx.send(()).unwrap();
        holder.await.unwrap();
        timeout(Duration::from_secs(1), guard.read("a", || async {}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn readers_share_a_key() {
        let guard = Arc::new(KeyedAccessGuard::new());
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let holder = {
            let guard = guard.clone();
            tokio::spawn(async move {
                guard
                    .read("a", || async move {
                        entered_tx.send(()).unwrap();
                        release_rx.await.unwrap();
                    })
                    .await;
            })
        };
        entered_rx.await.unwrap();

        let second = timeout(Duration::from_secs(1), guard.read("a", || async { "ok" })).await;
        assert_eq!(second.unwrap(), "ok");

        release_tx.send(()).unwrap();
        holder.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn writers_on_same_key_are_serialized() {
        let guard = Arc::new(KeyedAccessGuard::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let guard = guard.clone();
                let inside = inside.clone();
                let max_inside = max_inside.clone();
                tokio::spawn(async move {
                    guard
                        .write("shared", move || async move {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_inside.fetch_max(now, Ordering::SeqCst);
                            tokio::task::yield_now().await;
                            inside.fetch_sub(1, Ordering::SeqCst);
                        })
                        .await;
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(guard.active_keys(), 0);
    }

    #[tokio::test]
    async fn entries_are_evicted_after_release() {
        let guard = KeyedAccessGuard::new();

        guard.write("a", || async {}).await;
        guard.read("b", || async {}).await;

        assert_eq!(guard.active_keys(), 0);
    }

    #[tokio::test]
    async fn cancelled_operation_releases_its_entry() {
        let guard = KeyedAccessGuard::new();

        let pending = timeout(
            Duration::from_millis(10),
            guard.write("a", || std::future::pending::<()>()),
        )
        .await;

        assert!(pending.is_err());
        assert_eq!(guard.active_keys(), 0);
        timeout(Duration::from_secs(1), guard.write("a", || async {}))
            .await
            .unwrap();
    }
}
