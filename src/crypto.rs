//! Credential sealing using AES-256-GCM
//!
//! Access tokens, refresh tokens and webhook secrets are persisted as
//! versioned AES-256-GCM envelopes. The additional authenticated data (AAD)
//! binds every envelope to the immutable identity of its repository link, so a
//! ciphertext copied onto another row fails to open.

#![allow(deprecated)]

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
};
use std::fmt;

use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

const VERSION_ENCRYPTED: u8 = 0x01;
const VERSION_FIELD_LEN: usize = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_ENCRYPTED_LEN: usize = VERSION_FIELD_LEN + NONCE_LEN + TAG_LEN;

/// Crypto error types
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("invalid ciphertext format")]
    InvalidFormat,
    #[error("empty ciphertext")]
    EmptyCiphertext,
}

/// Secure wrapper for encryption keys with zeroization
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingKey(Vec<u8>);

impl fmt::Debug for ZeroizingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CryptoKey([REDACTED])")
    }
}

/// Type alias for crypto keys
pub type CryptoKey = ZeroizingKey;

impl CryptoKey {
    /// Create a new crypto key from bytes
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength(bytes.len()));
        }
        Ok(ZeroizingKey(bytes))
    }

    /// Get the key as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Encrypt bytes using AES-256-GCM
pub fn encrypt_bytes(
    key: &CryptoKey,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(cipher_key);

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    // version || nonce || ciphertext+tag
    let mut result = Vec::with_capacity(VERSION_FIELD_LEN + NONCE_LEN + ciphertext.len());
    result.push(VERSION_ENCRYPTED);
    result.extend_from_slice(&nonce);
    result.append(&mut ciphertext);

    Ok(result)
}

/// Decrypt bytes using AES-256-GCM
pub fn decrypt_bytes(
    key: &CryptoKey,
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() {
        return Err(CryptoError::EmptyCiphertext);
    }

    if !is_encrypted_payload(ciphertext) {
        return Err(CryptoError::InvalidFormat);
    }

    let nonce = Nonce::from_slice(&ciphertext[VERSION_FIELD_LEN..VERSION_FIELD_LEN + NONCE_LEN]);
    let tag_and_ct = &ciphertext[VERSION_FIELD_LEN + NONCE_LEN..];

    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(cipher_key);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: tag_and_ct,
                aad,
            },
        )
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Determine if a payload is using the encrypted format
pub fn is_encrypted_payload(ciphertext: &[u8]) -> bool {
    ciphertext.len() >= MIN_ENCRYPTED_LEN && ciphertext[0] == VERSION_ENCRYPTED
}

/// Builds the AAD for credentials of the repository linking `project_id` to
/// `external_id` on `vcs_id`. All three values are immutable after creation.
pub fn repository_aad(vcs_id: i32, project_id: i32, external_id: &str) -> String {
    format!("repository|{}|{}|{}", vcs_id, project_id, external_id)
}

/// Encrypts a UTF-8 secret for storage
pub fn seal_secret(key: &CryptoKey, aad: &str, secret: &str) -> Result<Vec<u8>, CryptoError> {
    encrypt_bytes(key, aad.as_bytes(), secret.as_bytes())
}

/// Decrypts a stored secret back to its UTF-8 form
pub fn open_secret(key: &CryptoKey, aad: &str, ciphertext: &[u8]) -> Result<String, CryptoError> {
    let bytes = decrypt_bytes(key, aad.as_bytes(), ciphertext)?;
    String::from_utf8(bytes)
        .map_err(|e| CryptoError::DecryptionFailed(format!("Invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> CryptoKey {
        CryptoKey::new(vec![0u8; 32]).expect("valid test key")
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let aad = b"test-aad";
        let plaintext = b"secret message";

        let encrypted = encrypt_bytes(&key, aad, plaintext).expect("encryption succeeds");
        let decrypted = decrypt_bytes(&key, aad, &encrypted).expect("decryption succeeds");

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_different_aad_fails() {
        let key = test_key();
        let encrypted = encrypt_bytes(&key, b"test-aad-1", b"secret").expect("encryption succeeds");

        assert!(decrypt_bytes(&key, b"test-aad-2", &encrypted).is_err());
    }

    #[test]
    fn test_modified_ciphertext_fails() {
        let key = test_key();
        let aad = b"test-aad";

        let mut encrypted = encrypt_bytes(&key, aad, b"secret message").expect("encryption succeeds");
        encrypted[13] ^= 0x01;

        assert!(decrypt_bytes(&key, aad, &encrypted).is_err());
    }

    #[test]
    fn test_empty_secret_is_sealed() {
        let key = test_key();
        let aad = repository_aad(1, 5, "42");

        let sealed = seal_secret(&key, &aad, "").expect("seal succeeds");
        assert!(is_encrypted_payload(&sealed));
        assert_eq!(open_secret(&key, &aad, &sealed).expect("open succeeds"), "");
    }

    #[test]
    fn test_nonce_uniqueness() {
        let key = test_key();
        let aad = b"test-aad";

        let encrypted1 = encrypt_bytes(&key, aad, b"secret").expect("encryption succeeds");
        let encrypted2 = encrypt_bytes(&key, aad, b"secret").expect("encryption succeeds");

        assert_ne!(&encrypted1[1..13], &encrypted2[1..13]);
    }

    #[test]
    fn test_secret_bound_to_repository_identity() {
        let key = test_key();
        let sealed =
            seal_secret(&key, &repository_aad(1, 5, "42"), "glpat-xyz").expect("seal succeeds");

        assert_eq!(
            open_secret(&key, &repository_aad(1, 5, "42"), &sealed).unwrap(),
            "glpat-xyz"
        );
        assert!(open_secret(&key, &repository_aad(1, 6, "42"), &sealed).is_err());
        assert!(open_secret(&key, &repository_aad(2, 5, "42"), &sealed).is_err());
    }

    #[test]
    fn test_plaintext_payload_rejected() {
        let key = test_key();
        let result = decrypt_bytes(&key, b"aad", b"plain-token");
        assert!(matches!(result, Err(CryptoError::InvalidFormat)));

        let result = decrypt_bytes(&key, b"aad", &[]);
        assert!(matches!(result, Err(CryptoError::EmptyCiphertext)));
    }

    #[test]
    fn test_debug_does_not_print_key() {
        let rendered = format!("{:?}", CryptoKey::new(vec![0xAB; 32]).unwrap());
        assert_eq!(rendered, "CryptoKey([REDACTED])");
    }

    #[test]
    fn test_invalid_key_length_rejected() {
        assert!(matches!(
            CryptoKey::new(vec![0u8; 16]),
            Err(CryptoError::InvalidKeyLength(16))
        ));
        assert!(CryptoKey::new(vec![0u8; 64]).is_err());
    }

    #[test]
    fn test_insufficient_ciphertext_length() {
        let key = test_key();
        let short_ciphertext = vec![VERSION_ENCRYPTED, 0x02];

        let result = decrypt_bytes(&key, b"aad", &short_ciphertext);
        assert!(matches!(result, Err(CryptoError::InvalidFormat)));
    }
}
