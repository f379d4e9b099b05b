use chrono::Utc;

use crate::{
    Store,
    error::{Result, StoreError},
    types::{Account, AccountPatch, NewAccount, PushTemplate},
};

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    email: String,
    provider_tag: String,
    host: String,
    port: i64,
    credential_ciphertext: Vec<u8>,
    is_active: bool,
    sort_order: i64,
    poll_interval_seconds: Option<i64>,
    telegram_push_enabled: bool,
    push_template: String,
    last_uid_watermark: Option<String>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(r: AccountRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            provider_tag: r.provider_tag,
            host: r.host,
            port: r.port,
            credential_ciphertext: r.credential_ciphertext,
            is_active: r.is_active,
            sort_order: r.sort_order,
            poll_interval_seconds: r.poll_interval_seconds,
            telegram_push_enabled: r.telegram_push_enabled,
            push_template: PushTemplate::parse(&r.push_template),
            last_uid_watermark: r.last_uid_watermark,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, provider_tag, host, port, credential_ciphertext, \
    is_active, sort_order, poll_interval_seconds, telegram_push_enabled, push_template, \
    last_uid_watermark, created_at, updated_at";

impl Store {
    pub async fn upsert_account(&self, spec: NewAccount) -> Result<Account> {
        if let Some(seconds) = spec.poll_interval_seconds
            && seconds < 5
        {
            return Err(StoreError::Invalid(
                "poll_interval_seconds must be >= 5".into(),
            ));
        }

        let now = Utc::now();
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO accounts (email, provider_tag, host, port, credential_ciphertext, \
             is_active, sort_order, poll_interval_seconds, telegram_push_enabled, \
             push_template, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?, ?, ?, ?) \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&spec.email)
        .bind(&spec.provider_tag)
        .bind(&spec.host)
        .bind(spec.port)
        .bind(&spec.credential_ciphertext)
        .bind(spec.sort_order)
        .bind(spec.poll_interval_seconds)
        .bind(spec.telegram_push_enabled)
        .bind(spec.push_template.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("account with email {} already exists", spec.email))
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(row.into())
    }

    pub async fn get_account(&self, id: i64) -> Result<Account> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;
        Ok(row.into())
    }

    pub async fn list_accounts(&self, active_only: bool) -> Result<Vec<Account>> {
        let sql = if active_only {
            format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE is_active = 1 ORDER BY sort_order ASC, id ASC")
        } else {
            format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY sort_order ASC, id ASC")
        };
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn update_account(&self, id: i64, patch: AccountPatch) -> Result<Account> {
        let current = self.get_account(id).await?;
        let now = Utc::now();

        let provider_tag = patch.provider_tag.unwrap_or(current.provider_tag);
        let host = patch.host.unwrap_or(current.host);
        let port = patch.port.unwrap_or(current.port);
        let credential_ciphertext = patch
            .credential_ciphertext
            .unwrap_or(current.credential_ciphertext);
        let is_active = patch.is_active.unwrap_or(current.is_active);
        let sort_order = patch.sort_order.unwrap_or(current.sort_order);
        let poll_interval_seconds = patch
            .poll_interval_seconds
            .unwrap_or(current.poll_interval_seconds);
        let telegram_push_enabled = patch
            .telegram_push_enabled
            .unwrap_or(current.telegram_push_enabled);
        let push_template = patch.push_template.unwrap_or(current.push_template);

        if let Some(seconds) = poll_interval_seconds
            && seconds < 5
        {
            return Err(StoreError::Invalid(
                "poll_interval_seconds must be >= 5".into(),
            ));
        }

        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE accounts SET provider_tag = ?, host = ?, port = ?, \
             credential_ciphertext = ?, is_active = ?, sort_order = ?, \
             poll_interval_seconds = ?, telegram_push_enabled = ?, push_template = ?, \
             updated_at = ? WHERE id = ? RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&provider_tag)
        .bind(&host)
        .bind(port)
        .bind(&credential_ciphertext)
        .bind(is_active)
        .bind(sort_order)
        .bind(poll_interval_seconds)
        .bind(telegram_push_enabled)
        .bind(push_template.as_str())
        .bind(now)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Persist the watermark returned by a successful IMAP fetch.
    pub async fn set_watermark(&self, id: i64, watermark: &str) -> Result<()> {
        sqlx::query("UPDATE accounts SET last_uid_watermark = ?, updated_at = ? WHERE id = ?")
            .bind(watermark)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_account(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("account {id}")));
        }
        Ok(())
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PushTemplate;

    fn new_spec(email: &str) -> NewAccount {
        NewAccount {
            email: email.into(),
            provider_tag: "generic".into(),
            host: "imap.example.com".into(),
            port: 993,
            credential_ciphertext: vec![1, 2, 3],
            sort_order: 0,
            poll_interval_seconds: None,
            telegram_push_enabled: true,
            push_template: PushTemplate::Short,
        }
    }

    #[tokio::test]
    async fn create_and_list() {
        let store = Store::in_memory().await.unwrap();
        store.upsert_account(new_spec("a@x.com")).await.unwrap();
        store.upsert_account(new_spec("b@x.com")).await.unwrap();

        let accounts = store.list_accounts(false).await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].email, "a@x.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let store = Store::in_memory().await.unwrap();
        store.upsert_account(new_spec("a@x.com")).await.unwrap();
        let err = store.upsert_account(new_spec("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn create_rejects_short_interval() {
        let store = Store::in_memory().await.unwrap();
        let mut spec = new_spec("a@x.com");
        spec.poll_interval_seconds = Some(1);
        let err = store.upsert_account(spec).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn update_rejects_short_interval() {
        let store = Store::in_memory().await.unwrap();
        let account = store.upsert_account(new_spec("a@x.com")).await.unwrap();
        let mut patch = AccountPatch::default();
        patch.poll_interval_seconds = Some(Some(1));
        let err = store.update_account(account.id, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn delete_cascades_to_messages() {
        let store = Store::in_memory().await.unwrap();
        let account = store.upsert_account(new_spec("a@x.com")).await.unwrap();

        use crate::types::NewMessageFields;
        store
            .insert_message_if_new(
                account.id,
                "m1@x",
                NewMessageFields {
                    subject: "hi".into(),
                    sender: "s@x.com".into(),
                    body_text: "body".into(),
                    body_html: None,
                    content_summary: "body".into(),
                    received_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        store.delete_account(account.id).await.unwrap();

        let (items, total) = store
            .query_messages(
                crate::types::MessageFilter {
                    account_id: Some(account.id),
                    ..Default::default()
                },
                crate::types::Page {
                    page: 1,
                    page_size: 50,
                },
            )
            .await
            .unwrap();
        assert_eq!(total, 0);
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn inactive_accounts_excluded_from_active_only() {
        let store = Store::in_memory().await.unwrap();
        let account = store.upsert_account(new_spec("a@x.com")).await.unwrap();
        let mut patch = AccountPatch::default();
        patch.is_active = Some(false);
        store.update_account(account.id, patch).await.unwrap();

        let active = store.list_accounts(true).await.unwrap();
        assert!(active.is_empty());
        let all = store.list_accounts(false).await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
