use crate::{error::Result, retry::post_json_with_retry};

/// POST a `sendMessage` call to the Telegram Bot API.
pub async fn send(
    client: &reqwest::Client,
    bot_token: &str,
    chat_id: &str,
    text: &str,
) -> Result<()> {
    let url = format!("https://api.telegram.org/bot{bot_token}/sendMessage");
    let body = serde_json::json!({
        "chat_id": chat_id,
        "text": text,
    });
    post_json_with_retry(client, &url, &body, "telegram sendMessage").await
}
