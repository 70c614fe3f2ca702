use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async lock per order increment id.
///
/// HTTP deliveries run concurrently with each other and with the Kafka
/// worker; holding the order's lock across load and reaction keeps two of
/// them from both seeing a shipment as unnotified.
#[derive(Default)]
pub struct OrderLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held while an order is being reacted to. Drops its map entry when no one
/// else is waiting on it.
pub struct OrderLockGuard<'a> {
    owner: &'a OrderLocks,
    increment_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn acquire(&self, increment_id: &str) -> OrderLockGuard<'_> {
        let lock = self
            .map()
            .entry(increment_id.to_string())
            .or_default()
            .clone();

        OrderLockGuard {
            owner: self,
            increment_id: increment_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Orders with a lock entry right now
    pub fn tracked(&self) -> usize {
        self.map().len()
    }
}

impl Drop for OrderLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut map = self.owner.map();
        // Only the map holds it: nobody is queued behind us.
        if map
            .get(&self.increment_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.increment_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let locks = OrderLocks::new();

        {
            let _guard = locks.acquire("000000001").await;
            assert_eq!(locks.tracked(), 1);
        }

        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_same_order_waits() {
        let locks = Arc::new(OrderLocks::new());
        let guard = locks.acquire("000000001").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("000000001").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        // Entry survives while someone is queued
        drop(guard);
        assert_eq!(locks.tracked(), 1);

        waiter.await.unwrap();
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_other_orders_do_not_wait() {
        let locks = OrderLocks::new();
        let _first = locks.acquire("000000001").await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire("000000002")).await;

        assert!(second.is_ok());
    }
}
