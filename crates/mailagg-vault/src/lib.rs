//! Process-wide credential cipher.
//!
//! A single 256-bit key, sourced from `ENCRYPTION_KEY` at boot, encrypts and
//! decrypts account app-passwords with XChaCha20-Poly1305. Trait-based so the
//! backend could be swapped; only one implementation ships. Key rotation is
//! out of scope: existing ciphertexts become unreadable if the key changes,
//! which is the documented operator contract.

pub mod error;
pub mod traits;
pub mod xchacha20;

pub use {error::VaultError, traits::Cipher, xchacha20::XChaCha20Poly1305Cipher};

/// Holds the process key and the cipher implementation together so callers
/// never pass the raw key around outside this crate.
pub struct CredentialVault {
    key: [u8; 32],
    cipher: XChaCha20Poly1305Cipher,
}

impl CredentialVault {
    #[must_use]
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key,
            cipher: XChaCha20Poly1305Cipher,
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, VaultError> {
        self.cipher.encrypt(&self.key, plaintext.as_bytes())
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<String, VaultError> {
        let bytes = self.cipher.decrypt(&self.key, ciphertext)?;
        String::from_utf8(bytes).map_err(|e| VaultError::Cipher(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_vault() {
        let vault = CredentialVault::new([7u8; 32]);
        let ciphertext = vault.encrypt("app-password-123").unwrap();
        assert_eq!(vault.decrypt(&ciphertext).unwrap(), "app-password-123");
    }
}
