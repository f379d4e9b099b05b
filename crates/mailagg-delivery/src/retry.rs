use std::time::Duration;

use tracing::warn;

use crate::error::{DeliveryError, Result};

const MAX_ATTEMPTS: usize = 5;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// POST `body` to `url` with exponential backoff (1s, 2s, 4s, 8s, 16s — 5
/// attempts total). Retries on transport errors, 5xx, and 429; any other
/// 4xx is terminal.
pub async fn post_json_with_retry(
    client: &reqwest::Client,
    url: &str,
    body: &serde_json::Value,
    operation: &'static str,
) -> Result<()> {
    let mut backoff = INITIAL_BACKOFF;

    for attempt in 1..=MAX_ATTEMPTS {
        let outcome = client.post(url).json(body).send().await;

        let status = match outcome {
            Ok(response) => response.status(),
            Err(err) => {
                if attempt == MAX_ATTEMPTS {
                    return Err(DeliveryError::Transport(err));
                }
                warn!(operation, attempt, error = %err, "transport error, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                continue;
            },
        };

        if status.is_success() {
            return Ok(());
        }

        let retryable = status.is_server_error() || status.as_u16() == 429;
        if !retryable {
            return Err(DeliveryError::Terminal {
                operation,
                status: status.as_u16(),
            });
        }

        if attempt == MAX_ATTEMPTS {
            return Err(DeliveryError::RetriesExhausted {
                operation,
                status: status.as_u16(),
            });
        }

        warn!(operation, attempt, status = status.as_u16(), "retryable response, backing off");
        tokio::time::sleep(backoff).await;
        backoff *= 2;
    }

    unreachable!("loop always returns on its final iteration")
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;

    #[tokio::test]
    async fn succeeds_on_first_try() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/hook", server.uri());
        post_json_with_retry(&client, &url, &serde_json::json!({"a": 1}), "webhook")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn terminal_4xx_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/hook", server.uri());
        let err = post_json_with_retry(&client, &url, &serde_json::json!({}), "webhook")
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Terminal { status: 400, .. }));
    }

    #[tokio::test]
    async fn retries_on_429_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/hook", server.uri());
        post_json_with_retry(&client, &url, &serde_json::json!({}), "webhook")
            .await
            .unwrap();
    }
}
