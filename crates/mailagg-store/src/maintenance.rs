//! Retention cleanup, archival, and settings export/import.
//!
//! Plain SQL maintenance operations invoked from the control plane, not a
//! batch-processing subsystem in their own right.

use chrono::Utc;

use crate::{
    Store,
    error::Result,
    types::{AccountStat, ArchiveResult, CleanupResult, ExportDocument, ExportedAccount, NewAccount, StatsOverview},
};

impl Store {
    /// Message counts per account over the trailing `window_days`, plus
    /// totals. Backs `GET /stats/overview`.
    pub async fn stats_overview(&self, window_days: i64) -> Result<StatsOverview> {
        let since = Utc::now() - chrono::Duration::days(window_days.max(0));

        let total_messages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        let messages_in_window: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE received_at >= ?")
                .bind(since)
                .fetch_one(&self.pool)
                .await?;

        let accounts = self.list_accounts(false).await?;
        let mut per_account = Vec::with_capacity(accounts.len());
        for account in accounts {
            let total: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE account_id = ?")
                    .bind(account.id)
                    .fetch_one(&self.pool)
                    .await?;
            let unread: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM messages WHERE account_id = ? AND is_read = 0",
            )
            .bind(account.id)
            .fetch_one(&self.pool)
            .await?;
            let in_window: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM messages WHERE account_id = ? AND received_at >= ?",
            )
            .bind(account.id)
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
            per_account.push(AccountStat {
                account_id: account.id,
                email: account.email,
                total_messages: total,
                unread_messages: unread,
                messages_in_window: in_window,
            });
        }

        Ok(StatsOverview {
            window_days,
            total_messages,
            messages_in_window,
            accounts: per_account,
        })
    }

    /// Delete messages older than `keep_days`, keeping at least
    /// `keep_per_account` of the most recent messages per account
    /// regardless of age. Either bound may be absent, in which case that
    /// constraint does not apply.
    pub async fn cleanup_retention(
        &self,
        keep_days: Option<i64>,
        keep_per_account: Option<i64>,
    ) -> Result<CleanupResult> {
        let deleted = self.select_retention_victims(keep_days, keep_per_account).await?;
        if deleted.is_empty() {
            return Ok(CleanupResult { deleted: 0 });
        }
        let mut tx = self.pool.begin().await?;
        for id in &deleted {
            sqlx::query("DELETE FROM messages WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(CleanupResult {
            deleted: deleted.len() as i64,
        })
    }

    /// Same selection as [`Self::cleanup_retention`], but the removed
    /// messages are serialized into a named `archives` row before deletion
    /// rather than discarded.
    pub async fn archive_retention(
        &self,
        name: &str,
        keep_days: Option<i64>,
        keep_per_account: Option<i64>,
    ) -> Result<ArchiveResult> {
        let ids = self.select_retention_victims(keep_days, keep_per_account).await?;
        if ids.is_empty() {
            return Ok(ArchiveResult {
                name: name.to_string(),
                archived: 0,
            });
        }

        let mut messages = Vec::with_capacity(ids.len());
        for id in &ids {
            messages.push(self.get_message(*id).await?);
        }
        let payload = serde_json::to_string(&messages)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO archives (name, created_at, payload) VALUES (?, ?, ?) \
             ON CONFLICT(name) DO UPDATE SET created_at = excluded.created_at, \
             payload = excluded.payload",
        )
        .bind(name)
        .bind(Utc::now())
        .bind(&payload)
        .execute(&mut *tx)
        .await?;
        for id in &ids {
            sqlx::query("DELETE FROM messages WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(ArchiveResult {
            name: name.to_string(),
            archived: ids.len() as i64,
        })
    }

    /// Raw JSON payload of a previously created archive, for `GET
    /// /stats/archive/{name}`.
    pub async fn get_archive(&self, name: &str) -> Result<String> {
        let row: (String,) = sqlx::query_as("SELECT payload FROM archives WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| crate::error::StoreError::NotFound(format!("archive {name}")))?;
        Ok(row.0)
    }

    /// Ids of messages eligible for retention cleanup/archival: older than
    /// `keep_days` (if set) and beyond the `keep_per_account` most recent
    /// per account (if set). With both bounds absent, nothing is selected.
    async fn select_retention_victims(
        &self,
        keep_days: Option<i64>,
        keep_per_account: Option<i64>,
    ) -> Result<Vec<i64>> {
        let Some(keep_days) = keep_days else {
            return Ok(Vec::new());
        };
        let cutoff = Utc::now() - chrono::Duration::days(keep_days.max(0));
        let keep_per_account = keep_per_account.unwrap_or(0).max(0);

        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT m.id FROM messages m WHERE m.received_at < ? AND ( \
             SELECT COUNT(*) FROM messages m2 \
             WHERE m2.account_id = m.account_id AND ( \
               m2.received_at > m.received_at \
               OR (m2.received_at = m.received_at AND m2.id > m.id) \
             ) \
             ) >= ?",
        )
        .bind(cutoff)
        .bind(keep_per_account)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// `{settings, accounts}` snapshot for `GET /settings/export`. Account
    /// credential ciphertext is included verbatim — export is a backup
    /// format, not a read path the no-plaintext invariant restricts (the
    /// bytes stay ciphered throughout).
    pub async fn export_state(&self) -> Result<ExportDocument> {
        let settings = self.get_settings().await?;
        let accounts = self
            .list_accounts(false)
            .await?
            .into_iter()
            .map(|a| ExportedAccount {
                email: a.email,
                provider_tag: a.provider_tag,
                host: a.host,
                port: a.port,
                credential_ciphertext: a.credential_ciphertext,
                is_active: a.is_active,
                sort_order: a.sort_order,
                poll_interval_seconds: a.poll_interval_seconds,
                telegram_push_enabled: a.telegram_push_enabled,
                push_template: a.push_template,
            })
            .collect();
        Ok(ExportDocument { settings, accounts })
    }

    /// Replace settings and upsert every exported account by email.
    /// Ciphertext bytes are written back unchanged, so round-tripping
    /// export then import with the same `ENCRYPTION_KEY` yields bit-identical
    /// credential ciphertexts.
    pub async fn import_state(&self, doc: ExportDocument) -> Result<()> {
        self.patch_settings(crate::types::SettingsPatch {
            telegram_bot_token: Some(doc.settings.telegram_bot_token),
            telegram_chat_id: Some(doc.settings.telegram_chat_id),
            poll_interval_seconds: Some(doc.settings.poll_interval_seconds),
            webhook_url: Some(doc.settings.webhook_url),
            api_token: Some(doc.settings.api_token),
            retention_keep_days: Some(doc.settings.retention_keep_days),
            retention_keep_per_account: Some(doc.settings.retention_keep_per_account),
            mirror_mark_read_to_server: Some(doc.settings.mirror_mark_read_to_server),
        })
        .await?;

        let existing = self.list_accounts(false).await?;
        for account in doc.accounts {
            let by_email = existing.iter().find(|a| a.email == account.email);
            match by_email {
                Some(current) => {
                    self.update_account(
                        current.id,
                        crate::types::AccountPatch {
                            provider_tag: Some(account.provider_tag),
                            host: Some(account.host),
                            port: Some(account.port),
                            credential_ciphertext: Some(account.credential_ciphertext),
                            is_active: Some(account.is_active),
                            sort_order: Some(account.sort_order),
                            poll_interval_seconds: Some(account.poll_interval_seconds),
                            telegram_push_enabled: Some(account.telegram_push_enabled),
                            push_template: Some(account.push_template),
                        },
                    )
                    .await?;
                },
                None => {
                    self.upsert_account(NewAccount {
                        email: account.email,
                        provider_tag: account.provider_tag,
                        host: account.host,
                        port: account.port,
                        credential_ciphertext: account.credential_ciphertext,
                        sort_order: account.sort_order,
                        poll_interval_seconds: account.poll_interval_seconds,
                        telegram_push_enabled: account.telegram_push_enabled,
                        push_template: account.push_template,
                    })
                    .await?;
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewMessageFields, PushTemplate};

    async fn setup_account(store: &Store, email: &str) -> i64 {
        store
            .upsert_account(NewAccount {
                email: email.into(),
                provider_tag: "generic".into(),
                host: "imap.example.com".into(),
                port: 993,
                credential_ciphertext: vec![9, 9, 9],
                sort_order: 0,
                poll_interval_seconds: None,
                telegram_push_enabled: true,
                push_template: PushTemplate::Short,
            })
            .await
            .unwrap()
            .id
    }

    fn fields(subject: &str, received_at: chrono::DateTime<Utc>) -> NewMessageFields {
        NewMessageFields {
            subject: subject.into(),
            sender: "sender@example.com".into(),
            body_text: "body".into(),
            body_html: None,
            content_summary: "body".into(),
            received_at,
        }
    }

    #[tokio::test]
    async fn stats_overview_counts_messages_per_account() {
        let store = Store::in_memory().await.unwrap();
        let account_id = setup_account(&store, "a@x.com").await;
        store
            .insert_message_if_new(account_id, "m1@x", fields("one", Utc::now()))
            .await
            .unwrap();
        store
            .insert_message_if_new(account_id, "m2@x", fields("two", Utc::now()))
            .await
            .unwrap();

        let overview = store.stats_overview(7).await.unwrap();
        assert_eq!(overview.total_messages, 2);
        assert_eq!(overview.accounts.len(), 1);
        assert_eq!(overview.accounts[0].total_messages, 2);
        assert_eq!(overview.accounts[0].unread_messages, 2);
    }

    #[tokio::test]
    async fn cleanup_retention_keeps_recent_messages_per_account() {
        let store = Store::in_memory().await.unwrap();
        let account_id = setup_account(&store, "a@x.com").await;
        let old = Utc::now() - chrono::Duration::days(60);
        for i in 0..5 {
            store
                .insert_message_if_new(account_id, &format!("m{i}@x"), fields(&format!("s{i}"), old))
                .await
                .unwrap();
        }

        let result = store.cleanup_retention(Some(30), Some(2)).await.unwrap();
        assert_eq!(result.deleted, 3);

        let (_, total) = store
            .query_messages(
                crate::types::MessageFilter {
                    account_id: Some(account_id),
                    ..Default::default()
                },
                crate::types::Page {
                    page: 1,
                    page_size: 50,
                },
            )
            .await
            .unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn archive_retention_preserves_deleted_messages() {
        let store = Store::in_memory().await.unwrap();
        let account_id = setup_account(&store, "a@x.com").await;
        let old = Utc::now() - chrono::Duration::days(60);
        store
            .insert_message_if_new(account_id, "m1@x", fields("archived", old))
            .await
            .unwrap();

        let result = store
            .archive_retention("2024-archive", Some(30), None)
            .await
            .unwrap();
        assert_eq!(result.archived, 1);

        let payload = store.get_archive("2024-archive").await.unwrap();
        assert!(payload.contains("archived"));

        let (_, total) = store
            .query_messages(Default::default(), crate::types::Page { page: 1, page_size: 50 })
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn export_then_import_round_trips_ciphertext() {
        let store = Store::in_memory().await.unwrap();
        setup_account(&store, "a@x.com").await;

        let exported = store.export_state().await.unwrap();
        assert_eq!(exported.accounts[0].credential_ciphertext, vec![9, 9, 9]);

        let fresh = Store::in_memory().await.unwrap();
        fresh.import_state(exported.clone()).await.unwrap();
        let reimported = fresh.export_state().await.unwrap();

        assert_eq!(
            reimported.accounts[0].credential_ciphertext,
            exported.accounts[0].credential_ciphertext
        );
    }
}
