use crate::{
    Store,
    error::Result,
    types::{NewPushFilter, PushFilter, PushFilterField, PushFilterMode},
};

#[derive(sqlx::FromRow)]
struct PushFilterRow {
    id: i64,
    account_id: i64,
    field: String,
    mode: String,
    value: String,
    rule_order: i64,
}

impl From<PushFilterRow> for PushFilter {
    fn from(r: PushFilterRow) -> Self {
        Self {
            id: r.id,
            account_id: r.account_id,
            field: PushFilterField::parse(&r.field),
            mode: PushFilterMode::parse(&r.mode),
            value: r.value,
            rule_order: r.rule_order,
        }
    }
}

const PUSH_FILTER_COLUMNS: &str = "id, account_id, field, mode, value, rule_order";

impl Store {
    pub async fn create_push_filter(&self, spec: NewPushFilter) -> Result<PushFilter> {
        let row = sqlx::query_as::<_, PushFilterRow>(&format!(
            "INSERT INTO push_filters (account_id, field, mode, value, rule_order) \
             VALUES (?, ?, ?, ?, ?) RETURNING {PUSH_FILTER_COLUMNS}"
        ))
        .bind(spec.account_id)
        .bind(spec.field.as_str())
        .bind(spec.mode.as_str())
        .bind(&spec.value)
        .bind(spec.rule_order)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Filters for one account, in evaluation order. The allow-then-deny
    /// semantics are applied by the delivery layer, not here.
    pub async fn list_push_filters(&self, account_id: i64) -> Result<Vec<PushFilter>> {
        let rows = sqlx::query_as::<_, PushFilterRow>(&format!(
            "SELECT {PUSH_FILTER_COLUMNS} FROM push_filters WHERE account_id = ? \
             ORDER BY rule_order ASC, id ASC"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn delete_push_filter(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM push_filters WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(crate::error::StoreError::NotFound(format!(
                "push filter {id}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_push_filters_respects_rule_order() {
        let store = Store::in_memory().await.unwrap();
        let account = store
            .upsert_account(crate::types::NewAccount {
                email: "a@x.com".into(),
                provider_tag: "generic".into(),
                host: "imap.example.com".into(),
                port: 993,
                credential_ciphertext: vec![],
                sort_order: 0,
                poll_interval_seconds: None,
                telegram_push_enabled: true,
                push_template: crate::types::PushTemplate::Short,
            })
            .await
            .unwrap();

        store
            .create_push_filter(NewPushFilter {
                account_id: account.id,
                field: PushFilterField::Domain,
                mode: PushFilterMode::Deny,
                value: "spam.example.com".into(),
                rule_order: 1,
            })
            .await
            .unwrap();
        store
            .create_push_filter(NewPushFilter {
                account_id: account.id,
                field: PushFilterField::Sender,
                mode: PushFilterMode::Allow,
                value: "boss@example.com".into(),
                rule_order: 0,
            })
            .await
            .unwrap();

        let filters = store.list_push_filters(account.id).await.unwrap();
        assert_eq!(filters[0].mode, PushFilterMode::Allow);
        assert_eq!(filters[1].mode, PushFilterMode::Deny);
    }
}
