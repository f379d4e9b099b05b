//! Per-account single-flight lock: at most one `Fetcher::run` per account is
//! ever in flight. A second caller observes the lock held and returns
//! immediately rather than queuing — held only across one poll iteration,
//! never across the scheduler's interval sleep.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock};

#[derive(Default)]
pub struct SingleFlightLocks {
    locks: RwLock<HashMap<i64, Arc<Mutex<()>>>>,
}

impl SingleFlightLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_for(&self, account_id: i64) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(&account_id) {
            return Arc::clone(lock);
        }
        let mut locks = self.locks.write().await;
        Arc::clone(
            locks
                .entry(account_id)
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Attempt to acquire the lock for `account_id`. Returns `None` if
    /// another fetch for the same account is already in flight.
    pub async fn try_acquire(&self, account_id: i64) -> Option<SingleFlightGuard> {
        let lock = self.lock_for(account_id).await;
        // Hold the Arc alive for the guard's lifetime; try_lock_owned fails
        // immediately rather than queuing behind an in-flight fetch.
        lock.try_lock_owned().ok().map(SingleFlightGuard)
    }
}

/// RAII guard; dropping it releases the per-account lock.
pub struct SingleFlightGuard(tokio::sync::OwnedMutexGuard<()>);
