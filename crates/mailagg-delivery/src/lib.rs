//! Notification fan-out: Telegram send and webhook POST,
//! both best-effort and at-most-once externally — there is no persistent
//! outbox, since IMAP remains the authoritative record and missed pushes
//! can be rebuilt via the reapply operation.

pub mod error;
pub mod filter;
pub mod retry;
pub mod telegram;
pub mod template;
pub mod webhook;

use mailagg_store::{Account, Message, PushFilter, Settings};
use tracing::warn;

pub use error::{DeliveryError, Result};

/// Outcome of one fan-out attempt. Both channels are attempted
/// independently; a failure in one does not block the other.
#[derive(Debug, Default)]
pub struct NotifyOutcome {
    pub telegram_sent: bool,
    pub telegram_error: Option<String>,
    pub webhook_sent: bool,
    pub webhook_error: Option<String>,
}

pub struct Dispatcher {
    client: reqwest::Client,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Attempt Telegram delivery and webhook delivery for one message.
    ///
    /// `push_telegram` is the Rule Engine's decision; `account.telegram_push_enabled`
    /// is re-checked here as the final veto — a rule can never turn Telegram
    /// delivery back on for an account that has it disabled.
    pub async fn notify(
        &self,
        account: &Account,
        message: &Message,
        push_telegram: bool,
        push_filters: &[PushFilter],
        settings: &Settings,
    ) -> NotifyOutcome {
        let mut outcome = NotifyOutcome::default();

        let telegram_allowed = push_telegram
            && account.telegram_push_enabled
            && filter::passes(push_filters, message);

        if telegram_allowed {
            if let (Some(token), Some(chat_id)) =
                (&settings.telegram_bot_token, &settings.telegram_chat_id)
            {
                let body = template::render(account.push_template, &account.email, message);
                match telegram::send(&self.client, token, chat_id, &body).await {
                    Ok(()) => outcome.telegram_sent = true,
                    Err(err) => {
                        warn!(account_id = account.id, error = %err, "telegram send failed");
                        outcome.telegram_error = Some(err.to_string());
                    },
                }
            }
        }

        if let Some(webhook_url) = &settings.webhook_url {
            let payload = webhook::WebhookPayload {
                account_email: &account.email,
                subject: &message.subject,
                sender: &message.sender,
                received_at: message.received_at,
                summary: &message.content_summary,
                labels: &message.labels,
                message_id: &message.message_id,
            };
            match webhook::send(&self.client, webhook_url, &payload).await {
                Ok(()) => outcome.webhook_sent = true,
                Err(err) => {
                    warn!(account_id = account.id, error = %err, "webhook post failed");
                    outcome.webhook_error = Some(err.to_string());
                },
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mailagg_store::PushTemplate;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path_regex},
    };

    use super::*;

    fn account(telegram_push_enabled: bool) -> Account {
        Account {
            id: 1,
            email: "a@x.com".into(),
            provider_tag: "generic".into(),
            host: "imap.example.com".into(),
            port: 993,
            credential_ciphertext: vec![],
            is_active: true,
            sort_order: 0,
            poll_interval_seconds: None,
            telegram_push_enabled,
            push_template: PushTemplate::Short,
            last_uid_watermark: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn message() -> Message {
        Message {
            id: 1,
            account_id: 1,
            message_id: "<1@x>".into(),
            subject: "hello".into(),
            sender: "sender@x.com".into(),
            body_text: "body".into(),
            body_html: None,
            content_summary: "body".into(),
            received_at: Utc::now(),
            is_read: false,
            labels: vec!["urgent".into()],
        }
    }

    fn settings(webhook_url: &str) -> Settings {
        Settings {
            telegram_bot_token: Some("TOKEN".into()),
            telegram_chat_id: Some("123".into()),
            poll_interval_seconds: 300,
            webhook_url: Some(webhook_url.into()),
            api_token: None,
            retention_keep_days: None,
            retention_keep_per_account: None,
            mirror_mark_read_to_server: true,
        }
    }

    #[tokio::test]
    async fn account_veto_blocks_telegram_even_when_rule_allows_it() {
        // No Telegram mock is wired up at all: the veto must stop the
        // dispatcher before it ever reaches the network, not merely return
        // an error from a failed call.
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(".*"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new();
        let outcome = dispatcher
            .notify(
                &account(false),
                &message(),
                true,
                &[],
                &settings(&format!("{}/hook", server.uri())),
            )
            .await;

        assert!(!outcome.telegram_sent);
        assert!(outcome.webhook_sent);
    }

    #[tokio::test]
    async fn webhook_posts_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(".*"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new();
        let outcome = dispatcher
            .notify(
                &account(false),
                &message(),
                false,
                &[],
                &settings(&format!("{}/hook", server.uri())),
            )
            .await;

        assert!(outcome.webhook_sent);
    }
}
