//! Cipher error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("cipher error: {0}")]
    Cipher(String),

    #[error("ciphertext too short to contain a nonce and tag")]
    Truncated,
}

impl VaultError {
    #[must_use]
    pub fn kind(&self) -> mailagg_common::ErrorKind {
        mailagg_common::ErrorKind::Fatal
    }
}
