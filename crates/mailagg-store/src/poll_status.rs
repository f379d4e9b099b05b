use crate::{Store, error::Result, types::PollStatus};

#[derive(sqlx::FromRow)]
struct PollStatusRow {
    account_id: i64,
    last_started_at: Option<chrono::DateTime<chrono::Utc>>,
    last_finished_at: Option<chrono::DateTime<chrono::Utc>>,
    last_success_at: Option<chrono::DateTime<chrono::Utc>>,
    last_error: Option<String>,
}

impl From<PollStatusRow> for PollStatus {
    fn from(r: PollStatusRow) -> Self {
        Self {
            account_id: r.account_id,
            last_started_at: r.last_started_at,
            last_finished_at: r.last_finished_at,
            last_success_at: r.last_success_at,
            last_error: r.last_error,
        }
    }
}

const POLL_STATUS_COLUMNS: &str =
    "account_id, last_started_at, last_finished_at, last_success_at, last_error";

impl Store {
    /// Upsert the poll status row for an account, merging the patch over
    /// whatever is currently recorded (or over an all-`None` row on first
    /// write). Called at the start and end of every scheduler tick.
    pub async fn record_poll_status(
        &self,
        account_id: i64,
        patch: crate::types::PollStatusPatch,
    ) -> Result<PollStatus> {
        let current = self.get_poll_status(account_id).await?;

        let last_started_at = patch.last_started_at.or(current.last_started_at);
        let last_finished_at = patch.last_finished_at.or(current.last_finished_at);
        let last_success_at = patch.last_success_at.or(current.last_success_at);
        let last_error = patch.last_error.unwrap_or(current.last_error);

        let row = sqlx::query_as::<_, PollStatusRow>(&format!(
            "INSERT INTO poll_status (account_id, last_started_at, last_finished_at, \
             last_success_at, last_error) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(account_id) DO UPDATE SET \
             last_started_at = excluded.last_started_at, \
             last_finished_at = excluded.last_finished_at, \
             last_success_at = excluded.last_success_at, \
             last_error = excluded.last_error \
             RETURNING {POLL_STATUS_COLUMNS}"
        ))
        .bind(account_id)
        .bind(last_started_at)
        .bind(last_finished_at)
        .bind(last_success_at)
        .bind(&last_error)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn get_poll_status(&self, account_id: i64) -> Result<PollStatus> {
        let row = sqlx::query_as::<_, PollStatusRow>(&format!(
            "SELECT {POLL_STATUS_COLUMNS} FROM poll_status WHERE account_id = ?"
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map_or_else(
            || PollStatus {
                account_id,
                ..Default::default()
            },
            Into::into,
        ))
    }

    /// Status for every account, used by the health and accounts-status
    /// endpoints.
    pub async fn list_poll_status(&self) -> Result<Vec<PollStatus>> {
        let rows = sqlx::query_as::<_, PollStatusRow>(&format!(
            "SELECT {POLL_STATUS_COLUMNS} FROM poll_status ORDER BY account_id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewAccount, PollStatusPatch, PushTemplate};

    async fn setup_account(store: &Store) -> i64 {
        store
            .upsert_account(NewAccount {
                email: "a@x.com".into(),
                provider_tag: "generic".into(),
                host: "imap.example.com".into(),
                port: 993,
                credential_ciphertext: vec![],
                sort_order: 0,
                poll_interval_seconds: None,
                telegram_push_enabled: true,
                push_template: PushTemplate::Short,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn get_poll_status_defaults_to_empty_row() {
        let store = Store::in_memory().await.unwrap();
        let account_id = setup_account(&store).await;
        let status = store.get_poll_status(account_id).await.unwrap();
        assert!(status.last_started_at.is_none());
        assert!(status.last_error.is_none());
    }

    #[tokio::test]
    async fn record_poll_status_is_monotone_across_ticks() {
        let store = Store::in_memory().await.unwrap();
        let account_id = setup_account(&store).await;

        let started = chrono::Utc::now();
        store
            .record_poll_status(
                account_id,
                PollStatusPatch {
                    last_started_at: Some(started),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let finished = store
            .record_poll_status(
                account_id,
                PollStatusPatch {
                    last_finished_at: Some(started),
                    last_success_at: Some(started),
                    last_error: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(finished.last_started_at, Some(started));
        assert_eq!(finished.last_success_at, Some(started));
    }
}
