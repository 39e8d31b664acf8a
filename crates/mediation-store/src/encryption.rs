//! Provider credential encryption.
//!
//! AES-256-GCM, packed as `nonce(12) || ciphertext+tag`, base64-encoded and
//! prefixed with `enc:` so a cipher can distinguish its own output from a
//! legacy or never-encrypted plaintext row and pass the latter through
//! unchanged on decrypt. The original Python source used Fernet, which has
//! no direct equivalent here, so AES-GCM was adopted instead.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use mediation_core::CredentialCipher;
use rand::Rng;

const ENC_PREFIX: &str = "enc:";

/// Encrypts with a real AES-256-GCM key when one is configured; otherwise
/// degrades to a logged-insecure passthrough.
pub enum AesGcmCipher {
    Keyed(Aes256Gcm),
    Insecure,
}

impl AesGcmCipher {
    /// `key` must be exactly 32 bytes. `None` constructs the insecure
    /// passthrough variant and logs a warning, matching the original
    /// `EncryptionService.__init__`'s graceful degradation.
    pub fn new(key: Option<&[u8]>) -> Self {
        match key {
            Some(key) => match Aes256Gcm::new_from_slice(key) {
                Ok(cipher) => AesGcmCipher::Keyed(cipher),
                Err(_) => {
                    tracing::warn!(
                        "provider encryption key is not 32 bytes; falling back to plain-text storage"
                    );
                    AesGcmCipher::Insecure
                }
            },
            None => {
                tracing::warn!("no provider encryption key configured; storing credentials in plain text");
                AesGcmCipher::Insecure
            }
        }
    }
}

impl CredentialCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let AesGcmCipher::Keyed(cipher) = self else {
            return plaintext.to_vec();
        };

        let mut nonce_bytes = [0u8; 12];
        rand::thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        match cipher.encrypt(nonce, plaintext) {
            Ok(ciphertext) => {
                let mut packed = Vec::with_capacity(12 + ciphertext.len());
                packed.extend_from_slice(&nonce_bytes);
                packed.extend_from_slice(&ciphertext);
                let encoded = base64::engine::general_purpose::STANDARD.encode(&packed);
                format!("{ENC_PREFIX}{encoded}").into_bytes()
            }
            Err(e) => {
                tracing::error!(error = %e, "AES-256-GCM encryption failed; storing plain text credential");
                plaintext.to_vec()
            }
        }
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Vec<u8> {
        let AesGcmCipher::Keyed(cipher) = self else {
            return ciphertext.to_vec();
        };

        let Ok(text) = std::str::from_utf8(ciphertext) else {
            return ciphertext.to_vec();
        };
        let Some(encoded) = text.strip_prefix(ENC_PREFIX) else {
            // Legacy / never-encrypted row: pass through (mirrors the
            // source's InvalidToken -> plaintext fallback in decrypt()).
            tracing::warn!("decrypting a credential with no enc: prefix; treating as legacy plaintext");
            return ciphertext.to_vec();
        };

        let packed = match base64::engine::general_purpose::STANDARD.decode(encoded) {
            Ok(p) => p,
            Err(_) => return ciphertext.to_vec(),
        };
        if packed.len() < 12 {
            return ciphertext.to_vec();
        }
        let (nonce_bytes, body) = packed.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);

        match cipher.decrypt(nonce, body) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                tracing::error!(error = %e, "AES-256-GCM decryption failed");
                Vec::new()
            }
        }
    }

    fn is_encrypting(&self) -> bool {
        matches!(self, AesGcmCipher::Keyed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_a_real_key() {
        let key = [7u8; 32];
        let cipher = AesGcmCipher::new(Some(&key));
        assert!(cipher.is_encrypting());

        let plaintext = b"sk-super-secret-api-key";
        let encrypted = cipher.encrypt(plaintext);
        assert_ne!(encrypted, plaintext);
        assert!(encrypted.starts_with(ENC_PREFIX.as_bytes()));

        let decrypted = cipher.decrypt(&encrypted);
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn missing_key_is_insecure_passthrough() {
        let cipher = AesGcmCipher::new(None);
        assert!(!cipher.is_encrypting());
        let plaintext = b"some-key";
        assert_eq!(cipher.encrypt(plaintext), plaintext);
        assert_eq!(cipher.decrypt(plaintext), plaintext);
    }

    #[test]
    fn legacy_plaintext_without_prefix_passes_through_on_decrypt() {
        let key = [3u8; 32];
        let cipher = AesGcmCipher::new(Some(&key));
        let legacy = b"an-old-unencrypted-key";
        assert_eq!(cipher.decrypt(legacy), legacy);
    }

    #[test]
    fn malformed_key_length_degrades_to_insecure() {
        let cipher = AesGcmCipher::new(Some(&[1u8; 5]));
        assert!(!cipher.is_encrypting());
    }
}
