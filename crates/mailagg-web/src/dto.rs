//! Request/response shapes for the control plane, plus the present/absent/
//! null helper PATCH DTOs need for fields like `poll_interval_seconds`
//! where null means "inherit the global setting" and omission means
//! "leave unchanged."

use mailagg_store::PushTemplate;
use serde::{Deserialize, Deserializer, Serialize};

/// Used with `#[serde(default, deserialize_with = "deserialize_some")]` on an
/// `Option<Option<T>>` field: the outer `None` (the `default`) means the key
/// was absent from the request body; `Some(None)` means it was present and
/// `null`; `Some(Some(v))` means it was present with a value.
pub fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountCreateRequest {
    pub email: String,
    pub provider_tag: String,
    pub host: String,
    pub port: i64,
    pub password: String,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub poll_interval_seconds: Option<i64>,
    #[serde(default = "default_true")]
    pub telegram_push_enabled: bool,
    #[serde(default)]
    pub push_template: PushTemplate,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountPatchRequest {
    #[serde(default)]
    pub provider_tag: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<i64>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub poll_interval_seconds: Option<Option<i64>>,
    #[serde(default)]
    pub telegram_push_enabled: Option<bool>,
    #[serde(default)]
    pub push_template: Option<PushTemplate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushFilterCreateRequest {
    pub field: mailagg_store::PushFilterField,
    pub mode: mailagg_store::PushFilterMode,
    pub value: String,
    #[serde(default)]
    pub rule_order: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleCreateRequest {
    pub name: String,
    #[serde(default)]
    pub rule_order: i64,
    #[serde(default)]
    pub account_id: Option<i64>,
    #[serde(default)]
    pub sender_pattern: String,
    #[serde(default)]
    pub subject_pattern: String,
    #[serde(default)]
    pub body_pattern: String,
    #[serde(default)]
    pub add_labels: Vec<String>,
    #[serde(default)]
    pub push_telegram: bool,
    #[serde(default)]
    pub mark_read: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulePatchRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rule_order: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub account_id: Option<Option<i64>>,
    #[serde(default)]
    pub sender_pattern: Option<String>,
    #[serde(default)]
    pub subject_pattern: Option<String>,
    #[serde(default)]
    pub body_pattern: Option<String>,
    #[serde(default)]
    pub add_labels: Option<Vec<String>>,
    #[serde(default)]
    pub push_telegram: Option<bool>,
    #[serde(default)]
    pub mark_read: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsPatchRequest {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub telegram_bot_token: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub telegram_chat_id: Option<Option<String>>,
    #[serde(default)]
    pub poll_interval_seconds: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub webhook_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub api_token: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub retention_keep_days: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub retention_keep_per_account: Option<Option<i64>>,
    #[serde(default)]
    pub mirror_mark_read_to_server: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct EmailListQuery {
    pub account_id: Option<i64>,
    pub keyword: Option<String>,
    pub is_read: Option<bool>,
    pub label: Option<String>,
    pub date_from: Option<chrono::DateTime<chrono::Utc>>,
    pub date_to: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct EmailListResponse {
    pub items: Vec<mailagg_store::Message>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplyRulesRequest {
    #[serde(default)]
    pub account_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ApplyRulesResponse {
    pub updated: i64,
    pub total: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupRequest {
    #[serde(default)]
    pub keep_days: Option<i64>,
    #[serde(default)]
    pub keep_per_account: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub keep_days: Option<i64>,
    #[serde(default)]
    pub keep_per_account: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsOverviewQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AccountStatusEntry {
    pub account_id: i64,
    pub email: String,
    pub is_active: bool,
    pub last_started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_success_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub poller: PollerHealth,
}

#[derive(Debug, Default, Serialize)]
pub struct PollerHealth {
    pub last_started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub reset_token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthConfigResponse {
    pub reset_enabled: bool,
}
