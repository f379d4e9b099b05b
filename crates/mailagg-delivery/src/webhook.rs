use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::Result, retry::post_json_with_retry};

#[derive(Serialize)]
pub struct WebhookPayload<'a> {
    pub account_email: &'a str,
    pub subject: &'a str,
    pub sender: &'a str,
    pub received_at: DateTime<Utc>,
    pub summary: &'a str,
    pub labels: &'a [String],
    pub message_id: &'a str,
}

pub async fn send(client: &reqwest::Client, url: &str, payload: &WebhookPayload<'_>) -> Result<()> {
    let body = serde_json::to_value(payload).unwrap_or(serde_json::Value::Null);
    post_json_with_retry(client, url, &body, "webhook post").await
}
