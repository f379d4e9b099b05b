use chrono::{DateTime, Utc};

use crate::{
    Store,
    accounts::is_unique_violation,
    error::{Result, StoreError},
    types::{Message, MessageFilter, NewMessageFields, Page},
};

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    account_id: i64,
    message_id: String,
    subject: String,
    sender: String,
    body_text: String,
    body_html: Option<String>,
    content_summary: String,
    received_at: DateTime<Utc>,
    is_read: bool,
    labels: String,
}

impl TryFrom<MessageRow> for Message {
    type Error = StoreError;

    fn try_from(r: MessageRow) -> Result<Self> {
        Ok(Self {
            id: r.id,
            account_id: r.account_id,
            message_id: r.message_id,
            subject: r.subject,
            sender: r.sender,
            body_text: r.body_text,
            body_html: r.body_html,
            content_summary: r.content_summary,
            received_at: r.received_at,
            is_read: r.is_read,
            labels: serde_json::from_str(&r.labels)?,
        })
    }
}

const MESSAGE_COLUMNS: &str = "id, account_id, message_id, subject, sender, body_text, \
    body_html, content_summary, received_at, is_read, labels";

impl Store {
    /// Atomic at-most-once gate: on unique violation of (account_id,
    /// message_id), returns the existing row with `inserted = false`.
    pub async fn insert_message_if_new(
        &self,
        account_id: i64,
        message_id: &str,
        fields: NewMessageFields,
    ) -> Result<(Message, bool)> {
        let insert = sqlx::query_as::<_, MessageRow>(&format!(
            "INSERT INTO messages (account_id, message_id, subject, sender, body_text, \
             body_html, content_summary, received_at, is_read, labels) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, '[]') RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(account_id)
        .bind(message_id)
        .bind(&fields.subject)
        .bind(&fields.sender)
        .bind(&fields.body_text)
        .bind(&fields.body_html)
        .bind(&fields.content_summary)
        .bind(fields.received_at)
        .fetch_one(&self.pool)
        .await;

        match insert {
            Ok(row) => Ok((row.try_into()?, true)),
            Err(e) if is_unique_violation(&e) => {
                let existing = sqlx::query_as::<_, MessageRow>(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages WHERE account_id = ? AND message_id = ?"
                ))
                .bind(account_id)
                .bind(message_id)
                .fetch_one(&self.pool)
                .await?;
                Ok((existing.try_into()?, false))
            },
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    pub async fn get_message(&self, id: i64) -> Result<Message> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("message {id}")))?;
        row.try_into()
    }

    /// Apply the rule engine's decision to a message in one transaction:
    /// union the new labels into the existing set and OR in `mark_read`.
    pub async fn apply_rule_decision(
        &self,
        message_id: i64,
        add_labels: &[String],
        mark_read: bool,
    ) -> Result<Message> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"
        ))
        .bind(message_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("message {message_id}")))?;

        let mut labels: Vec<String> = serde_json::from_str(&row.labels)?;
        for label in add_labels {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
        let labels_json = serde_json::to_string(&labels)?;
        let is_read = row.is_read || mark_read;

        let updated = sqlx::query_as::<_, MessageRow>(&format!(
            "UPDATE messages SET labels = ?, is_read = ? WHERE id = ? RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(&labels_json)
        .bind(is_read)
        .bind(message_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        updated.try_into()
    }

    /// Clear labels for messages in scope, used by the reapply-rules
    /// maintenance operation before re-running the engine.
    pub async fn clear_labels(&self, account_id: Option<i64>) -> Result<()> {
        match account_id {
            Some(id) => {
                sqlx::query("UPDATE messages SET labels = '[]' WHERE account_id = ?")
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
            },
            None => {
                sqlx::query("UPDATE messages SET labels = '[]'")
                    .execute(&self.pool)
                    .await?;
            },
        }
        Ok(())
    }

    pub async fn mark_read(&self, message_id: i64, is_read: bool) -> Result<Message> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "UPDATE messages SET is_read = ? WHERE id = ? RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(is_read)
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("message {message_id}")))?;
        row.try_into()
    }

    /// Query messages with the given filters. Secondary sort is always
    /// `received_at DESC, id DESC` for stable pagination.
    pub async fn query_messages(
        &self,
        filter: MessageFilter,
        page: Page,
    ) -> Result<(Vec<Message>, i64)> {
        let mut count_builder = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM messages");
        push_filter_where(&mut count_builder, &filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut list_builder =
            sqlx::QueryBuilder::new(format!("SELECT {MESSAGE_COLUMNS} FROM messages"));
        push_filter_where(&mut list_builder, &filter);
        list_builder.push(" ORDER BY received_at DESC, id DESC LIMIT ");
        list_builder.push_bind(page.page_size.max(1));
        list_builder.push(" OFFSET ");
        list_builder.push_bind(page.offset());

        let rows = list_builder
            .build_query_as::<MessageRow>()
            .fetch_all(&self.pool)
            .await?;
        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>>>()?;

        Ok((items, total))
    }
}

fn push_filter_where(builder: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>, filter: &MessageFilter) {
    let mut first = true;
    let mut push_clause = |builder: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>, sql: &str| {
        builder.push(if first { " WHERE " } else { " AND " });
        builder.push(sql);
        first = false;
    };

    if let Some(account_id) = filter.account_id {
        push_clause(builder, "account_id = ");
        builder.push_bind(account_id);
    }
    if let Some(ref keyword) = filter.keyword {
        let pattern = like_pattern(keyword);
        push_clause(
            builder,
            "(subject LIKE ",
        );
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR sender LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR content_summary LIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }
    if let Some(is_read) = filter.is_read {
        push_clause(builder, "is_read = ");
        builder.push_bind(is_read);
    }
    if let Some(ref label) = filter.label {
        push_clause(
            builder,
            "EXISTS (SELECT 1 FROM json_each(messages.labels) WHERE json_each.value = ",
        );
        builder.push_bind(label.clone());
        builder.push(")");
    }
    if let Some(date_from) = filter.date_from {
        push_clause(builder, "received_at >= ");
        builder.push_bind(date_from);
    }
    if let Some(date_to) = filter.date_to {
        push_clause(builder, "received_at <= ");
        builder.push_bind(date_to);
    }
}

fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewAccount, PushTemplate};

    async fn setup_account(store: &Store) -> i64 {
        let account = store
            .upsert_account(NewAccount {
                email: "a@x.com".into(),
                provider_tag: "generic".into(),
                host: "imap.example.com".into(),
                port: 993,
                credential_ciphertext: vec![1, 2, 3],
                sort_order: 0,
                poll_interval_seconds: None,
                telegram_push_enabled: true,
                push_template: PushTemplate::Short,
            })
            .await
            .unwrap();
        account.id
    }

    fn fields(subject: &str) -> NewMessageFields {
        NewMessageFields {
            subject: subject.into(),
            sender: "sender@example.com".into(),
            body_text: "body text".into(),
            body_html: None,
            content_summary: "body text".into(),
            received_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_is_idempotent_per_account_and_message_id() {
        let store = Store::in_memory().await.unwrap();
        let account_id = setup_account(&store).await;

        let (first, inserted1) = store
            .insert_message_if_new(account_id, "a@x", fields("first"))
            .await
            .unwrap();
        assert!(inserted1);

        let (second, inserted2) = store
            .insert_message_if_new(account_id, "a@x", fields("different subject this time"))
            .await
            .unwrap();
        assert!(!inserted2);
        assert_eq!(first.id, second.id);
        assert_eq!(second.subject, "first");
    }

    #[tokio::test]
    async fn apply_rule_decision_unions_labels() {
        let store = Store::in_memory().await.unwrap();
        let account_id = setup_account(&store).await;
        let (msg, _) = store
            .insert_message_if_new(account_id, "a@x", fields("alert"))
            .await
            .unwrap();

        store
            .apply_rule_decision(msg.id, &["P1".into()], true)
            .await
            .unwrap();
        let updated = store
            .apply_rule_decision(msg.id, &["P1".into(), "P2".into()], false)
            .await
            .unwrap();

        assert_eq!(updated.labels, vec!["P1".to_string(), "P2".to_string()]);
        assert!(updated.is_read);
    }

    #[tokio::test]
    async fn query_messages_filters_by_label_and_paginates() {
        let store = Store::in_memory().await.unwrap();
        let account_id = setup_account(&store).await;

        for i in 0..5 {
            let (msg, _) = store
                .insert_message_if_new(account_id, &format!("m{i}@x"), fields(&format!("s{i}")))
                .await
                .unwrap();
            if i % 2 == 0 {
                store
                    .apply_rule_decision(msg.id, &["even".into()], false)
                    .await
                    .unwrap();
            }
        }

        let (items, total) = store
            .query_messages(
                MessageFilter {
                    label: Some("even".into()),
                    ..Default::default()
                },
                Page {
                    page: 1,
                    page_size: 50,
                },
            )
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 3);

        let (page1, total_all) = store
            .query_messages(
                MessageFilter::default(),
                Page {
                    page: 1,
                    page_size: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(total_all, 5);
        assert_eq!(page1.len(), 2);
    }
}
