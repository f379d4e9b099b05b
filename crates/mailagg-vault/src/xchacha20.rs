//! XChaCha20-Poly1305 implementation of the [`Cipher`] trait.

#[allow(deprecated)] // upstream generic-array 0.x deprecation
use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;

use crate::{error::VaultError, traits::Cipher};

const NONCE_LEN: usize = 24;

/// Encrypted blob layout: `[nonce: 24 bytes][ciphertext + Poly1305 tag]`.
pub struct XChaCha20Poly1305Cipher;

impl Cipher for XChaCha20Poly1305Cipher {
    #[allow(deprecated)]
    fn encrypt(&self, key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let cipher = XChaCha20Poly1305::new(key.into());

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| VaultError::Cipher(e.to_string()))?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    #[allow(deprecated)]
    fn decrypt(&self, key: &[u8; 32], ciphertext: &[u8]) -> Result<Vec<u8>, VaultError> {
        if ciphertext.len() < NONCE_LEN + 16 {
            return Err(VaultError::Truncated);
        }

        let (nonce_bytes, ct) = ciphertext.split_at(NONCE_LEN);
        let nonce = XNonce::from_slice(nonce_bytes);
        let cipher = XChaCha20Poly1305::new(key.into());

        cipher
            .decrypt(nonce, ct)
            .map_err(|e| VaultError::Cipher(e.to_string()))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let cipher = XChaCha20Poly1305Cipher;
        let key = [0x42u8; 32];
        let plaintext = b"hunter2-app-password";

        let encrypted = cipher.encrypt(&key, plaintext).unwrap();
        let decrypted = cipher.decrypt(&key, &encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn wrong_key_fails() {
        let cipher = XChaCha20Poly1305Cipher;
        let key1 = [0x42u8; 32];
        let key2 = [0x43u8; 32];

        let encrypted = cipher.encrypt(&key1, b"secret").unwrap();
        assert!(cipher.decrypt(&key2, &encrypted).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let cipher = XChaCha20Poly1305Cipher;
        let key = [0x42u8; 32];

        let mut encrypted = cipher.encrypt(&key, b"secret").unwrap();
        let last = encrypted.len() - 1;
        encrypted[last] ^= 0x01;
        assert!(cipher.decrypt(&key, &encrypted).is_err());
    }

    #[test]
    fn too_short_ciphertext_fails() {
        let cipher = XChaCha20Poly1305Cipher;
        let key = [0x42u8; 32];
        assert!(matches!(
            cipher.decrypt(&key, &[0u8; 10]),
            Err(VaultError::Truncated)
        ));
    }

    #[test]
    fn different_nonces_produce_different_ciphertexts() {
        let cipher = XChaCha20Poly1305Cipher;
        let key = [0x42u8; 32];

        let enc1 = cipher.encrypt(&key, b"same input").unwrap();
        let enc2 = cipher.encrypt(&key, b"same input").unwrap();
        assert_ne!(enc1, enc2);
    }

    #[test]
    fn empty_plaintext_round_trip() {
        let cipher = XChaCha20Poly1305Cipher;
        let key = [0x42u8; 32];

        let encrypted = cipher.encrypt(&key, b"").unwrap();
        let decrypted = cipher.decrypt(&key, &encrypted).unwrap();
        assert!(decrypted.is_empty());
    }
}
