//! Boot-time environment configuration.
//!
//! Loads a `.env` file if present, then reads the variables the process
//! needs to start. Missing required variables are a
//! [`ConfigError::MissingRequired`], fatal at boot.

use secrecy::Secret;
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 300;
pub const MIN_POLL_INTERVAL_SECONDS: u64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingRequired(&'static str),

    #[error("environment variable {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Fully resolved process configuration.
pub struct Settings {
    pub encryption_key: [u8; 32],
    pub database_url: String,
    pub admin_username: String,
    pub admin_password: Secret<String>,
    pub jwt_secret: Secret<String>,
    pub api_token: Option<String>,
    pub telegram_bot_token: Option<Secret<String>>,
    pub telegram_chat_id: Option<String>,
    pub webhook_url: Option<String>,
    pub poll_interval_seconds: u64,
    pub admin_reset_token: Option<Secret<String>>,
    pub bind: String,
    pub port: u16,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("encryption_key", &"[REDACTED]")
            .field("database_url", &self.database_url)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("webhook_url", &self.webhook_url)
            .field("poll_interval_seconds", &self.poll_interval_seconds)
            .field(
                "admin_reset_token",
                &self.admin_reset_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("bind", &self.bind)
            .field("port", &self.port)
            .finish()
    }
}

/// Load a `.env` file if present, then read and validate settings from the
/// process environment. `bind`/`port` default to `0.0.0.0:8080`.
pub fn load() -> Result<Settings> {
    dotenvy::dotenv().ok();
    load_from_env()
}

fn load_from_env() -> Result<Settings> {
    let encryption_key = required("ENCRYPTION_KEY")?;
    let encryption_key = decode_key(&encryption_key)?;

    let database_url = required("DATABASE_URL")?;
    let admin_username = required("ADMIN_USERNAME")?;
    let admin_password = Secret::new(required("ADMIN_PASSWORD")?);
    let jwt_secret = Secret::new(required("JWT_SECRET")?);

    let api_token = std::env::var("API_TOKEN").ok();
    let telegram_bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok().map(Secret::new);
    let telegram_chat_id = std::env::var("TELEGRAM_CHAT_ID").ok();
    let webhook_url = std::env::var("WEBHOOK_URL").ok();
    let admin_reset_token = std::env::var("ADMIN_RESET_TOKEN").ok().map(Secret::new);

    let poll_interval_seconds = match std::env::var("POLL_INTERVAL_SECONDS") {
        Ok(raw) => {
            let parsed: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                name: "POLL_INTERVAL_SECONDS",
                reason: format!("not a non-negative integer: {raw}"),
            })?;
            parsed.max(MIN_POLL_INTERVAL_SECONDS)
        },
        Err(_) => DEFAULT_POLL_INTERVAL_SECONDS,
    };

    let bind = std::env::var("BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);

    Ok(Settings {
        encryption_key,
        database_url,
        admin_username,
        admin_password,
        jwt_secret,
        api_token,
        telegram_bot_token,
        telegram_chat_id,
        webhook_url,
        poll_interval_seconds,
        admin_reset_token,
        bind,
        port,
    })
}

fn required(name: &'static str) -> Result<String> {
    std::env::var(name).map_err(|_| ConfigError::MissingRequired(name))
}

/// Accepts either 32 raw bytes, hex (64 chars), or standard base64.
fn decode_key(raw: &str) -> Result<[u8; 32]> {
    use base64::Engine as _;

    let bytes = if raw.len() == 64 && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        hex_decode(raw).map_err(|reason| ConfigError::Invalid {
            name: "ENCRYPTION_KEY",
            reason,
        })?
    } else if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(raw) {
        decoded
    } else {
        raw.as_bytes().to_vec()
    };

    bytes.try_into().map_err(|v: Vec<u8>| ConfigError::Invalid {
        name: "ENCRYPTION_KEY",
        reason: format!("expected 32 bytes, got {}", v.len()),
    })
}

fn hex_decode(s: &str) -> std::result::Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err("odd-length hex string".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_required_env() {
        // env vars are process-global; these tests run single-threaded.
        unsafe {
            std::env::set_var("ENCRYPTION_KEY", "0".repeat(64));
            std::env::set_var("DATABASE_URL", "sqlite::memory:");
            std::env::set_var("ADMIN_USERNAME", "admin");
            std::env::set_var("ADMIN_PASSWORD", "hunter2");
            std::env::set_var("JWT_SECRET", "jwt-secret-value");
        }
    }

    #[test]
    fn missing_required_is_error() {
        unsafe {
            std::env::remove_var("ENCRYPTION_KEY");
        }
        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired("ENCRYPTION_KEY")));
    }

    #[test]
    fn defaults_poll_interval_to_300() {
        set_required_env();
        unsafe {
            std::env::remove_var("POLL_INTERVAL_SECONDS");
        }
        let settings = load_from_env().unwrap();
        assert_eq!(settings.poll_interval_seconds, 300);
    }

    #[test]
    fn clamps_poll_interval_to_minimum_5() {
        set_required_env();
        unsafe {
            std::env::set_var("POLL_INTERVAL_SECONDS", "1");
        }
        let settings = load_from_env().unwrap();
        assert_eq!(settings.poll_interval_seconds, 5);
    }

    #[test]
    fn decodes_hex_key() {
        set_required_env();
        let settings = load_from_env().unwrap();
        assert_eq!(settings.encryption_key, [0u8; 32]);
    }
}
