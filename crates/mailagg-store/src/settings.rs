use crate::{
    Store,
    error::{Result, StoreError},
    types::Settings,
};

#[derive(sqlx::FromRow)]
struct SettingsRow {
    telegram_bot_token: Option<String>,
    telegram_chat_id: Option<String>,
    poll_interval_seconds: i64,
    webhook_url: Option<String>,
    api_token: Option<String>,
    retention_keep_days: Option<i64>,
    retention_keep_per_account: Option<i64>,
    mirror_mark_read_to_server: bool,
}

impl From<SettingsRow> for Settings {
    fn from(r: SettingsRow) -> Self {
        Self {
            telegram_bot_token: r.telegram_bot_token,
            telegram_chat_id: r.telegram_chat_id,
            poll_interval_seconds: r.poll_interval_seconds,
            webhook_url: r.webhook_url,
            api_token: r.api_token,
            retention_keep_days: r.retention_keep_days,
            retention_keep_per_account: r.retention_keep_per_account,
            mirror_mark_read_to_server: r.mirror_mark_read_to_server,
        }
    }
}

const SETTINGS_COLUMNS: &str = "telegram_bot_token, telegram_chat_id, poll_interval_seconds, \
    webhook_url, api_token, retention_keep_days, retention_keep_per_account, \
    mirror_mark_read_to_server";

impl Store {
    /// The singleton settings row, seeded by migration 0001.
    pub async fn get_settings(&self) -> Result<Settings> {
        let row = sqlx::query_as::<_, SettingsRow>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM settings WHERE id = 1"
        ))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn patch_settings(&self, patch: crate::types::SettingsPatch) -> Result<Settings> {
        let current = self.get_settings().await?;

        let telegram_bot_token = patch
            .telegram_bot_token
            .unwrap_or(current.telegram_bot_token);
        let telegram_chat_id = patch.telegram_chat_id.unwrap_or(current.telegram_chat_id);
        let poll_interval_seconds = patch
            .poll_interval_seconds
            .unwrap_or(current.poll_interval_seconds);
        if poll_interval_seconds < 5 {
            return Err(StoreError::Invalid(
                "poll_interval_seconds must be >= 5".into(),
            ));
        }
        let webhook_url = patch.webhook_url.unwrap_or(current.webhook_url);
        let api_token = patch.api_token.unwrap_or(current.api_token);
        let retention_keep_days = patch
            .retention_keep_days
            .unwrap_or(current.retention_keep_days);
        let retention_keep_per_account = patch
            .retention_keep_per_account
            .unwrap_or(current.retention_keep_per_account);
        let mirror_mark_read_to_server = patch
            .mirror_mark_read_to_server
            .unwrap_or(current.mirror_mark_read_to_server);

        let row = sqlx::query_as::<_, SettingsRow>(&format!(
            "UPDATE settings SET telegram_bot_token = ?, telegram_chat_id = ?, \
             poll_interval_seconds = ?, webhook_url = ?, api_token = ?, \
             retention_keep_days = ?, retention_keep_per_account = ?, \
             mirror_mark_read_to_server = ? WHERE id = 1 RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(&telegram_bot_token)
        .bind(&telegram_chat_id)
        .bind(poll_interval_seconds)
        .bind(&webhook_url)
        .bind(&api_token)
        .bind(retention_keep_days)
        .bind(retention_keep_per_account)
        .bind(mirror_mark_read_to_server)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SettingsPatch;

    #[tokio::test]
    async fn default_settings_are_seeded() {
        let store = Store::in_memory().await.unwrap();
        let settings = store.get_settings().await.unwrap();
        assert_eq!(settings.poll_interval_seconds, 300);
        assert!(settings.mirror_mark_read_to_server);
    }

    #[tokio::test]
    async fn patch_settings_clears_optional_field_to_null() {
        let store = Store::in_memory().await.unwrap();
        store
            .patch_settings(SettingsPatch {
                webhook_url: Some(Some("https://example.com/hook".into())),
                ..Default::default()
            })
            .await
            .unwrap();

        let cleared = store
            .patch_settings(SettingsPatch {
                webhook_url: Some(None),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(cleared.webhook_url, None);
    }

    #[tokio::test]
    async fn patch_settings_rejects_short_poll_interval() {
        let store = Store::in_memory().await.unwrap();
        let err = store
            .patch_settings(SettingsPatch {
                poll_interval_seconds: Some(1),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }
}
