//! Per-account serialization of nonce allocation.
//!
//! Reading the pending nonce and broadcasting the transaction that consumes
//! it must not interleave with another transfer from the same sender, or both
//! would sign with the same nonce. Each sender gets its own async mutex; the
//! guard is held from nonce fetch until the broadcast returns.

use std::sync::Arc;

use alloy::primitives::Address;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-address locks. Clones share the registry.
#[derive(Debug, Clone, Default)]
pub struct AccountLocks {
    inner: Arc<DashMap<Address, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `address`.
    pub async fn acquire(&self, address: Address) -> OwnedMutexGuard<()> {
        let lock = self.inner.entry(address).or_default().clone();
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn is_locked(&self, address: Address) -> bool {
        self.inner
            .get(&address)
            .map(|lock| lock.try_lock().is_err())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_address_is_exclusive() {
        let locks = AccountLocks::new();
        let addr = Address::repeat_byte(0x11);

        let guard = locks.acquire(addr).await;
        assert!(locks.is_locked(addr));

        let contender = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = contender.acquire(addr).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert!(!locks.is_locked(addr));
    }

    #[tokio::test]
    async fn test_different_addresses_do_not_block() {
        let locks = AccountLocks::new();
        let _a = locks.acquire(Address::repeat_byte(0x01)).await;
        let _b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(Address::repeat_byte(0x02)),
        )
        .await
        .expect("independent accounts must not contend");
    }
}
