//! Per-user single-writer lock.

use std::collections::HashMap;
use std::sync::Arc;

use common::UserId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes cart mutations and checkouts per user.
///
/// Different users never contend. Entries nobody holds or waits on are pruned
/// on the next acquire.
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    locks: Arc<Mutex<HashMap<UserId, Arc<Mutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other holder for `user_id` remains and returns the guard.
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of users with a holder or waiter.
    #[cfg(test)]
    async fn tracked_users(&self) -> usize {
        self.locks
            .lock()
            .await
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
