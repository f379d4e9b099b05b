//! Per-account fetch pipeline: single-flight IMAP poll,
//! at-most-once persistence, rule evaluation, and side-effect enqueue.

use std::sync::Arc;

use chrono::Utc;
use mailagg_delivery::Dispatcher;
use mailagg_imap::{FetchedMessage, ImapAccount, ImapTransport};
use mailagg_rules::evaluate;
use mailagg_store::{NewMessageFields, PollStatusPatch, Store};
use mailagg_vault::CredentialVault;
use tracing::{info, warn};

use crate::{error::Result, lock::SingleFlightLocks};

/// Outcome of one call to [`Fetcher::run`], used by the scheduler loop and
/// the on-demand fetch API to report what happened without the caller
/// needing to inspect `PollStatus` itself.
#[derive(Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A fetch for this account was already in flight; this call did nothing.
    AlreadyInFlight,
    Completed { new_messages: usize },
    Failed { error: String },
}

pub struct Fetcher {
    store: Arc<Store>,
    vault: Arc<CredentialVault>,
    dispatcher: Arc<Dispatcher>,
    transport: Arc<dyn ImapTransport>,
    locks: SingleFlightLocks,
}

impl Fetcher {
    #[must_use]
    pub fn new(
        store: Arc<Store>,
        vault: Arc<CredentialVault>,
        dispatcher: Arc<Dispatcher>,
        transport: Arc<dyn ImapTransport>,
    ) -> Self {
        Self {
            store,
            vault,
            dispatcher,
            transport,
            locks: SingleFlightLocks::new(),
        }
    }

    /// Run one poll iteration for `account_id`. Acquires the per-account
    /// single-flight lock for the duration of the iteration only (never
    /// across a sleep) and always updates `PollStatus` at the end, even on
    /// failure — the only case it does not touch `PollStatus` at all is
    /// when the lock was already held, which is a documented no-op.
    pub async fn run(&self, account_id: i64) -> Result<FetchOutcome> {
        let Some(_guard) = self.locks.try_acquire(account_id).await else {
            return Ok(FetchOutcome::AlreadyInFlight);
        };

        self.store
            .record_poll_status(
                account_id,
                PollStatusPatch {
                    last_started_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        match self.poll_once(account_id).await {
            Ok(new_messages) => {
                self.store
                    .record_poll_status(
                        account_id,
                        PollStatusPatch {
                            last_finished_at: Some(Utc::now()),
                            last_success_at: Some(Utc::now()),
                            last_error: Some(None),
                            ..Default::default()
                        },
                    )
                    .await?;
                info!(account_id, new_messages, "poll completed");
                Ok(FetchOutcome::Completed { new_messages })
            },
            Err(err) => {
                warn!(account_id, error = %err, "poll failed");
                self.store
                    .record_poll_status(
                        account_id,
                        PollStatusPatch {
                            last_finished_at: Some(Utc::now()),
                            last_error: Some(Some(err.to_string())),
                            ..Default::default()
                        },
                    )
                    .await?;
                Ok(FetchOutcome::Failed {
                    error: err.to_string(),
                })
            },
        }
    }

    async fn poll_once(&self, account_id: i64) -> Result<usize> {
        let account = self.store.get_account(account_id).await?;
        let password = self.vault.decrypt(&account.credential_ciphertext)?;
        let rules = self.store.list_rules(account_id).await?;
        let read_write = rules.iter().any(|r| r.mark_read);
        let port = u16::try_from(account.port.clamp(1, i64::from(u16::MAX))).unwrap_or(993);

        let imap_account = ImapAccount {
            host: &account.host,
            port,
            username: &account.email,
            password: &password,
            read_write,
        };

        let (fetched, new_watermark) = self
            .transport
            .fetch_new(&imap_account, account.last_uid_watermark.as_deref())
            .await?;

        let settings = self.store.get_settings().await?;
        let push_filters = self.store.list_push_filters(account_id).await?;
        let mut side_effects = Vec::new();
        let mut new_messages = 0usize;

        for item in &fetched {
            let inserted = self.process_message(&account, item, &rules, &settings, &push_filters, &mut side_effects).await?;
            if inserted {
                new_messages += 1;
            }
        }

        // Side-effect tasks (server-side mark-read, Telegram, webhook) are
        // queued as independent tasks so a slow/retrying push never holds
        // up persistence of the next message in this batch; we still wait
        // for them before returning so a poll iteration is fully settled
        // before the scheduler sleeps again.
        let _ = futures::future::join_all(side_effects).await;

        if let Some(watermark) = new_watermark {
            self.store.set_watermark(account_id, &watermark).await?;
        }

        Ok(new_messages)
    }

    /// Insert-if-new, evaluate, apply, and enqueue side effects for one
    /// fetched message. Returns whether it was newly inserted (a duplicate
    /// short-circuits after step 1, per the at-most-once contract).
    #[allow(clippy::too_many_arguments)]
    async fn process_message(
        &self,
        account: &mailagg_store::Account,
        item: &FetchedMessage,
        rules: &[mailagg_store::Rule],
        settings: &mailagg_store::Settings,
        push_filters: &[mailagg_store::PushFilter],
        side_effects: &mut Vec<tokio::task::JoinHandle<()>>,
    ) -> Result<bool> {
        let (message, inserted) = self
            .store
            .insert_message_if_new(
                account.id,
                &item.message_id,
                NewMessageFields {
                    subject: item.subject.clone(),
                    sender: item.sender.clone(),
                    body_text: item.body_text.clone(),
                    body_html: item.body_html.clone(),
                    content_summary: item.content_summary.clone(),
                    received_at: item.received_at,
                },
            )
            .await?;

        if !inserted {
            return Ok(false);
        }

        let decision = evaluate(&message, rules, account.telegram_push_enabled);
        let message = self
            .store
            .apply_rule_decision(message.id, &decision.add_labels, decision.mark_read)
            .await?;

        if decision.mark_read && settings.mirror_mark_read_to_server {
            let transport = Arc::clone(&self.transport);
            let host = account.host.clone();
            let email = account.email.clone();
            let password_ciphertext = account.credential_ciphertext.clone();
            let vault = Arc::clone(&self.vault);
            let port = u16::try_from(account.port.clamp(1, i64::from(u16::MAX))).unwrap_or(993);
            let uid = item.uid;
            let account_id = account.id;
            side_effects.push(tokio::spawn(async move {
                let Ok(password) = vault.decrypt(&password_ciphertext) else {
                    warn!(account_id, "could not decrypt credential for mark-read mirror");
                    return;
                };
                let imap_account = ImapAccount {
                    host: &host,
                    port,
                    username: &email,
                    password: &password,
                    read_write: true,
                };
                if let Err(err) = transport.mark_read(&imap_account, uid).await {
                    warn!(account_id, uid, error = %err, "server-side mark-read failed");
                }
            }));
        }

        let dispatcher = Arc::clone(&self.dispatcher);
        let account = account.clone();
        let settings = settings.clone();
        let push_filters = push_filters.to_vec();
        let push_telegram = decision.push_telegram;
        side_effects.push(tokio::spawn(async move {
            let outcome = dispatcher
                .notify(&account, &message, push_telegram, &push_filters, &settings)
                .await;
            if let Some(err) = outcome.telegram_error {
                warn!(account_id = account.id, error = %err, "telegram delivery gave up");
            }
            if let Some(err) = outcome.webhook_error {
                warn!(account_id = account.id, error = %err, "webhook delivery gave up");
            }
        }));

        Ok(true)
    }

    /// Run a fetch once without the scheduler, used by the on-demand fetch
    /// API endpoint. Shares the same single-flight lock as the scheduler
    /// loop, so a manual trigger can never overlap a scheduled poll.
    pub async fn run_on_demand(&self, account_id: i64) -> Result<FetchOutcome> {
        self.run(account_id).await
    }
}
