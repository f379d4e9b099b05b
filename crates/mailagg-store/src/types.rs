//! Row types and patch/filter DTOs for the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushTemplate {
    FullEmail,
    Full,
    #[default]
    Short,
    TitleOnly,
}

impl PushTemplate {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullEmail => "full_email",
            Self::Full => "full",
            Self::Short => "short",
            Self::TitleOnly => "title_only",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "full_email" => Self::FullEmail,
            "full" => Self::Full,
            "title_only" => Self::TitleOnly,
            _ => Self::Short,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub provider_tag: String,
    pub host: String,
    pub port: i64,
    #[serde(skip_serializing)]
    pub credential_ciphertext: Vec<u8>,
    pub is_active: bool,
    pub sort_order: i64,
    pub poll_interval_seconds: Option<i64>,
    pub telegram_push_enabled: bool,
    pub push_template: PushTemplate,
    pub last_uid_watermark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new account. The caller supplies the
/// already-encrypted credential; the store never sees plaintext.
pub struct NewAccount {
    pub email: String,
    pub provider_tag: String,
    pub host: String,
    pub port: i64,
    pub credential_ciphertext: Vec<u8>,
    pub sort_order: i64,
    pub poll_interval_seconds: Option<i64>,
    pub telegram_push_enabled: bool,
    pub push_template: PushTemplate,
}

/// Partial update. `Option<Option<_>>` fields distinguish "don't touch" (outer
/// `None`) from "set to null" (inner `None`) —
/// this matters for `poll_interval_seconds` where null means inherit global.
#[derive(Default)]
pub struct AccountPatch {
    pub provider_tag: Option<String>,
    pub host: Option<String>,
    pub port: Option<i64>,
    pub credential_ciphertext: Option<Vec<u8>>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i64>,
    pub poll_interval_seconds: Option<Option<i64>>,
    pub telegram_push_enabled: Option<bool>,
    pub push_template: Option<PushTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub account_id: i64,
    pub message_id: String,
    pub subject: String,
    pub sender: String,
    pub body_text: String,
    pub body_html: Option<String>,
    pub content_summary: String,
    pub received_at: DateTime<Utc>,
    pub is_read: bool,
    pub labels: Vec<String>,
}

/// Fields supplied by the fetcher for a newly observed message.
pub struct NewMessageFields {
    pub subject: String,
    pub sender: String,
    pub body_text: String,
    pub body_html: Option<String>,
    pub content_summary: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushFilterField {
    Sender,
    Domain,
    Subject,
    Body,
}

impl PushFilterField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sender => "sender",
            Self::Domain => "domain",
            Self::Subject => "subject",
            Self::Body => "body",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "domain" => Self::Domain,
            "subject" => Self::Subject,
            "body" => Self::Body,
            _ => Self::Sender,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushFilterMode {
    Allow,
    Deny,
}

impl PushFilterMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "deny" => Self::Deny,
            _ => Self::Allow,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: i64,
    pub name: String,
    pub rule_order: i64,
    pub account_id: Option<i64>,
    pub sender_pattern: String,
    pub subject_pattern: String,
    pub body_pattern: String,
    pub add_labels: Vec<String>,
    pub push_telegram: bool,
    pub mark_read: bool,
}

pub struct NewRule {
    pub name: String,
    pub rule_order: i64,
    pub account_id: Option<i64>,
    pub sender_pattern: String,
    pub subject_pattern: String,
    pub body_pattern: String,
    pub add_labels: Vec<String>,
    pub push_telegram: bool,
    pub mark_read: bool,
}

#[derive(Default)]
pub struct RulePatch {
    pub name: Option<String>,
    pub rule_order: Option<i64>,
    pub account_id: Option<Option<i64>>,
    pub sender_pattern: Option<String>,
    pub subject_pattern: Option<String>,
    pub body_pattern: Option<String>,
    pub add_labels: Option<Vec<String>>,
    pub push_telegram: Option<bool>,
    pub mark_read: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushFilter {
    pub id: i64,
    pub account_id: i64,
    pub field: PushFilterField,
    pub mode: PushFilterMode,
    pub value: String,
    pub rule_order: i64,
}

pub struct NewPushFilter {
    pub account_id: i64,
    pub field: PushFilterField,
    pub mode: PushFilterMode,
    pub value: String,
    pub rule_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub poll_interval_seconds: i64,
    pub webhook_url: Option<String>,
    pub api_token: Option<String>,
    pub retention_keep_days: Option<i64>,
    pub retention_keep_per_account: Option<i64>,
    pub mirror_mark_read_to_server: bool,
}

#[derive(Default)]
pub struct SettingsPatch {
    pub telegram_bot_token: Option<Option<String>>,
    pub telegram_chat_id: Option<Option<String>>,
    pub poll_interval_seconds: Option<i64>,
    pub webhook_url: Option<Option<String>>,
    pub api_token: Option<Option<String>>,
    pub retention_keep_days: Option<Option<i64>>,
    pub retention_keep_per_account: Option<Option<i64>>,
    pub mirror_mark_read_to_server: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollStatus {
    pub account_id: i64,
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_finished_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Default)]
pub struct PollStatusPatch {
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_finished_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<Option<String>>,
}

/// Filter for [`crate::Store::query_messages`].
#[derive(Default)]
pub struct MessageFilter {
    pub account_id: Option<i64>,
    pub keyword: Option<String>,
    pub is_read: Option<bool>,
    pub label: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

pub struct Page {
    pub page: i64,
    pub page_size: i64,
}

impl Page {
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.page_size.max(1)
    }
}

/// Decision applied atomically to a message by the rule engine.
pub struct RuleDecisionPatch {
    pub add_labels: Vec<String>,
    pub mark_read: bool,
}

/// Per-account row of [`crate::Store::stats_overview`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStat {
    pub account_id: i64,
    pub email: String,
    pub total_messages: i64,
    pub unread_messages: i64,
    pub messages_in_window: i64,
}

/// Response shape for `GET /stats/overview`, a maintenance-facing read model
/// — not part of the core pipeline, but still a real query over the same
/// tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsOverview {
    pub window_days: i64,
    pub total_messages: i64,
    pub messages_in_window: i64,
    pub accounts: Vec<AccountStat>,
}

/// Outcome of the retention-cleanup maintenance operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CleanupResult {
    pub deleted: i64,
}

/// Outcome of archiving messages out of the live table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveResult {
    pub name: String,
    pub archived: i64,
}

/// The `{settings, accounts}` document served by `GET /settings/export` and
/// consumed by `POST /settings/import`. Credentials stay ciphered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub settings: Settings,
    pub accounts: Vec<ExportedAccount>,
}

/// An account row shaped for export/import: unlike [`Account`], the
/// ciphertext is included. Export is an administrator-facing backup format,
/// and the bytes stay ciphered throughout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedAccount {
    pub email: String,
    pub provider_tag: String,
    pub host: String,
    pub port: i64,
    pub credential_ciphertext: Vec<u8>,
    pub is_active: bool,
    pub sort_order: i64,
    pub poll_interval_seconds: Option<i64>,
    pub telegram_push_enabled: bool,
    pub push_template: PushTemplate,
}
