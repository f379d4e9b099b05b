//! Per-account polling loops: one cooperative task per active
//! account, each sleeping its own interval and invoking the [`Fetcher`]
//! directly rather than queuing through a shared channel.

use std::{collections::HashMap, sync::Arc};

use mailagg_store::Store;
use tokio::{sync::RwLock, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{error::Result, fetcher::Fetcher};

/// Handle to a running per-account poll loop.
struct AccountHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the set of running per-account loops and the shared [`Fetcher`] they
/// all invoke. `activate`/`deactivate` mirror account lifecycle changes made
/// through the control plane without requiring a process restart.
pub struct Scheduler {
    store: Arc<Store>,
    fetcher: Arc<Fetcher>,
    handles: RwLock<HashMap<i64, AccountHandle>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(store: Arc<Store>, fetcher: Arc<Fetcher>) -> Self {
        Self {
            store,
            fetcher,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Start a loop for every currently active account. Call once at boot,
    /// after which `activate`/`deactivate` keep the running set in sync.
    pub async fn start(&self) -> Result<()> {
        let accounts = self.store.list_accounts(true).await?;
        for account in accounts {
            self.activate(account.id).await;
        }
        Ok(())
    }

    /// Spawn the loop for `account_id` if it is not already running. The
    /// loop recomputes its sleep duration every iteration from the
    /// account's own `poll_interval_seconds` override, or the global
    /// setting when the account inherits it — so a `PATCH /settings` that
    /// changes the global interval is picked up by inheriting accounts on
    /// their next wake without needing to restart their loop.
    pub async fn activate(&self, account_id: i64) {
        let mut handles = self.handles.write().await;
        if handles.contains_key(&account_id) {
            return;
        }

        let cancel = CancellationToken::new();
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let loop_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            Self::run_loop(account_id, store, fetcher, loop_cancel).await;
        });

        handles.insert(account_id, AccountHandle { cancel, task });
        info!(account_id, "account poll loop started");
    }

    /// Cancel the loop for `account_id`, if running. Waits for the
    /// in-flight iteration (if any) to finish before returning, so a
    /// deactivated account is never mid-fetch when this call completes.
    pub async fn deactivate(&self, account_id: i64) {
        let handle = self.handles.write().await.remove(&account_id);
        if let Some(handle) = handle {
            handle.cancel.cancel();
            let _ = handle.task.await;
            info!(account_id, "account poll loop stopped");
        }
    }

    /// Trigger an immediate out-of-band fetch, independent of the account's
    /// own interval. Shares the fetcher's single-flight lock with the
    /// scheduled loop, so this never overlaps a poll already in flight.
    pub async fn fetch_now(&self, account_id: i64) -> Result<crate::fetcher::FetchOutcome> {
        self.fetcher.run_on_demand(account_id).await
    }

    /// Cancel every running loop and wait for them to settle. Each loop's
    /// in-flight iteration is allowed to finish; nothing is aborted mid-fetch.
    pub async fn shutdown(&self) {
        let handles: Vec<AccountHandle> = {
            let mut map = self.handles.write().await;
            map.drain().map(|(_, h)| h).collect()
        };
        for handle in handles {
            handle.cancel.cancel();
            let _ = handle.task.await;
        }
    }

    async fn run_loop(
        account_id: i64,
        store: Arc<Store>,
        fetcher: Arc<Fetcher>,
        cancel: CancellationToken,
    ) {
        loop {
            match fetcher.run(account_id).await {
                Ok(outcome) => debug!(account_id, ?outcome, "poll iteration finished"),
                Err(err) => debug!(account_id, error = %err, "poll iteration errored"),
            }

            let interval = Self::effective_interval(&store, account_id).await;
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(std::time::Duration::from_secs(interval)) => {},
            }
        }
    }

    /// The account's own override if set, otherwise the current global
    /// setting. Re-read on every wake rather than captured once, so
    /// changes to either take effect without restarting the loop.
    async fn effective_interval(store: &Store, account_id: i64) -> u64 {
        let account = match store.get_account(account_id).await {
            Ok(account) => account,
            Err(_) => return 300,
        };
        if let Some(seconds) = account.poll_interval_seconds {
            return seconds.max(5) as u64;
        }
        match store.get_settings().await {
            Ok(settings) => settings.poll_interval_seconds.max(5) as u64,
            Err(_) => 300,
        }
    }
}
