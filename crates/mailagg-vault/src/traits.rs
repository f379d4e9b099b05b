//! Cipher trait for the process-wide credential cipher.

use crate::error::VaultError;

/// Reversible, authenticated encryption over account credentials.
///
/// A single process-wide key, no per-record key wrapping and no password
/// unlock. Key rotation makes existing ciphertexts unreadable.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, VaultError>;

    fn decrypt(&self, key: &[u8; 32], ciphertext: &[u8]) -> Result<Vec<u8>, VaultError>;
}
