//! Minimal auth gate: bearer API token or a password-login session signed
//! with `JWT_SECRET`. Argon2 password hash and verify, a lazily-initialized
//! single admin row. No passkeys, no API-key management UI.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{AppError, Result};

const SESSION_TTL_SECONDS: i64 = 60 * 60 * 12;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Holds the admin identity and the one persisted row (the password hash)
/// that survives process restarts; everything else is process config.
pub struct AuthState {
    pool: SqlitePool,
    admin_username: String,
    jwt_secret: Secret<String>,
    admin_reset_token: Option<Secret<String>>,
}

impl AuthState {
    pub async fn new(
        pool: SqlitePool,
        admin_username: String,
        admin_password: &Secret<String>,
        jwt_secret: Secret<String>,
        admin_reset_token: Option<Secret<String>>,
    ) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS admin_auth (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                password_hash TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| AppError::Invalid(e.to_string()))?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM admin_auth WHERE id = 1")
                .fetch_optional(&pool)
                .await
                .map_err(|e| AppError::Invalid(e.to_string()))?;

        if existing.is_none() {
            let hash = hash_password(admin_password.expose_secret())
                .map_err(|e| AppError::Invalid(e.to_string()))?;
            sqlx::query("INSERT INTO admin_auth (id, password_hash) VALUES (1, ?)")
                .bind(hash)
                .execute(&pool)
                .await
                .map_err(|e| AppError::Invalid(e.to_string()))?;
        }

        Ok(Self {
            pool,
            admin_username,
            jwt_secret,
            admin_reset_token,
        })
    }

    async fn current_hash(&self) -> Result<String> {
        let row: (String,) = sqlx::query_as("SELECT password_hash FROM admin_auth WHERE id = 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Invalid(e.to_string()))?;
        Ok(row.0)
    }

    async fn set_hash(&self, hash: &str) -> Result<()> {
        sqlx::query("UPDATE admin_auth SET password_hash = ? WHERE id = 1")
            .bind(hash)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// Verify a login attempt and, on success, issue a signed session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        if username != self.admin_username {
            return Err(AppError::Unauthorized);
        }
        let hash = self.current_hash().await?;
        if !verify_password(password, &hash) {
            return Err(AppError::Unauthorized);
        }
        self.issue_token()
    }

    pub async fn change_password(&self, current: &str, new_password: &str) -> Result<()> {
        let hash = self.current_hash().await?;
        if !verify_password(current, &hash) {
            return Err(AppError::Unauthorized);
        }
        let new_hash =
            hash_password(new_password).map_err(|e| AppError::Invalid(e.to_string()))?;
        self.set_hash(&new_hash).await
    }

    /// Reset the password using `ADMIN_RESET_TOKEN` as a bearer of last
    /// resort, for when the admin has lost their password.
    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> Result<()> {
        let Some(expected) = &self.admin_reset_token else {
            return Err(AppError::Unauthorized);
        };
        if reset_token != expected.expose_secret() {
            return Err(AppError::Unauthorized);
        }
        let new_hash =
            hash_password(new_password).map_err(|e| AppError::Invalid(e.to_string()))?;
        self.set_hash(&new_hash).await
    }

    pub fn reset_enabled(&self) -> bool {
        self.admin_reset_token.is_some()
    }

    fn issue_token(&self) -> Result<String> {
        let claims = Claims {
            sub: self.admin_username.clone(),
            exp: (chrono::Utc::now().timestamp() + SESSION_TTL_SECONDS),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.expose_secret().as_bytes()),
        )
        .map_err(|e| AppError::Invalid(e.to_string()))
    }

    /// Validate a bearer token as either the configured API token or a
    /// signed session. Returns `Ok(())` if either check passes.
    pub fn authorize(&self, token: &str, api_token: Option<&str>) -> Result<()> {
        if let Some(expected) = api_token
            && !expected.is_empty()
            && token == expected
        {
            return Ok(());
        }
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map(|_| ())
        .map_err(|_| AppError::Unauthorized)
    }
}

fn hash_password(password: &str) -> std::result::Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| e.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn login_succeeds_with_correct_credentials() {
        let auth = AuthState::new(
            pool().await,
            "admin".into(),
            &Secret::new("hunter2".to_string()),
            Secret::new("jwt-secret".to_string()),
            None,
        )
        .await
        .unwrap();

        let token = auth.login("admin", "hunter2").await.unwrap();
        assert!(auth.authorize(&token, None).is_ok());
    }

    #[tokio::test]
    async fn login_fails_with_wrong_password() {
        let auth = AuthState::new(
            pool().await,
            "admin".into(),
            &Secret::new("hunter2".to_string()),
            Secret::new("jwt-secret".to_string()),
            None,
        )
        .await
        .unwrap();

        assert!(auth.login("admin", "wrong").await.is_err());
    }

    #[tokio::test]
    async fn api_token_bypasses_session_check() {
        let auth = AuthState::new(
            pool().await,
            "admin".into(),
            &Secret::new("hunter2".to_string()),
            Secret::new("jwt-secret".to_string()),
            None,
        )
        .await
        .unwrap();

        assert!(auth.authorize("raw-token", Some("raw-token")).is_ok());
        assert!(auth.authorize("garbage", Some("raw-token")).is_err());
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let auth = AuthState::new(
            pool().await,
            "admin".into(),
            &Secret::new("hunter2".to_string()),
            Secret::new("jwt-secret".to_string()),
            None,
        )
        .await
        .unwrap();

        assert!(auth.change_password("wrong", "new-pass").await.is_err());
        auth.change_password("hunter2", "new-pass").await.unwrap();
        assert!(auth.login("admin", "new-pass").await.is_ok());
        assert!(auth.login("admin", "hunter2").await.is_err());
    }

    #[tokio::test]
    async fn reset_password_requires_reset_token() {
        let auth = AuthState::new(
            pool().await,
            "admin".into(),
            &Secret::new("hunter2".to_string()),
            Secret::new("jwt-secret".to_string()),
            Some(Secret::new("reset-token".to_string())),
        )
        .await
        .unwrap();

        assert!(auth.reset_password("wrong-token", "new-pass").await.is_err());
        auth.reset_password("reset-token", "new-pass")
            .await
            .unwrap();
        assert!(auth.login("admin", "new-pass").await.is_ok());
    }
}
