//! Credential encryption using AES-256-GCM
//!
//! Provider tokens stored on a profile are sealed with AES-256-GCM. The
//! additional authenticated data is `"{user_id}|{field}"`, so a ciphertext
//! copied to another user or another column fails to open.

#![allow(deprecated)]

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use uuid::Uuid;

const VERSION_ENCRYPTED: u8 = 0x01;
const VERSION_FIELD_LEN: usize = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_ENCRYPTED_LEN: usize = VERSION_FIELD_LEN + NONCE_LEN + TAG_LEN;

/// Crypto error types
#[derive(Debug, Error)]
pub enum CryptoError {
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
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingKey(Vec<u8>);

/// Type alias for crypto keys
pub type CryptoKey = ZeroizingKey;

impl CryptoKey {
    /// Create a new crypto key from bytes
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::EncryptionFailed(
                "Invalid key length: expected 32 bytes".to_string(),
            ));
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
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
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

    // No version marker: legacy plaintext
    if ciphertext[0] != VERSION_ENCRYPTED {
        return Ok(ciphertext.to_vec());
    }

    if ciphertext.len() < MIN_ENCRYPTED_LEN {
        return Err(CryptoError::InvalidFormat);
    }

    let (nonce, sealed) = ciphertext[VERSION_FIELD_LEN..].split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload { msg: sealed, aad },
        )
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Determine if a payload is using the encrypted format
pub fn is_encrypted_payload(ciphertext: &[u8]) -> bool {
    ciphertext.len() >= MIN_ENCRYPTED_LEN && ciphertext[0] == VERSION_ENCRYPTED
}

/// Profile columns that hold sealed provider secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    ParagonToken,
    IntegrationAppToken,
    MergeLinkToken,
    MergeAccountToken,
}

impl ProfileField {
    pub const ALL: [ProfileField; 4] = [
        ProfileField::ParagonToken,
        ProfileField::IntegrationAppToken,
        ProfileField::MergeLinkToken,
        ProfileField::MergeAccountToken,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::ParagonToken => "paragon_token",
            ProfileField::IntegrationAppToken => "integration_app_token",
            ProfileField::MergeLinkToken => "merge_link_token",
            ProfileField::MergeAccountToken => "merge_account_token",
        }
    }

    /// Additional authenticated data binding a ciphertext to its owner and column.
    pub fn aad(&self, user_id: Uuid) -> String {
        format!("{}|{}", user_id, self.as_str())
    }
}

/// Encrypt a profile secret for storage.
pub fn seal_field(
    key: &CryptoKey,
    user_id: Uuid,
    field: ProfileField,
    value: &str,
) -> Result<Vec<u8>, CryptoError> {
    encrypt_bytes(key, field.aad(user_id).as_bytes(), value.as_bytes())
}

/// Decrypt a stored profile secret. Legacy plaintext values are returned as-is.
pub fn open_field(
    key: &CryptoKey,
    user_id: Uuid,
    field: ProfileField,
    stored: Option<&[u8]>,
) -> Result<Option<String>, CryptoError> {
    let Some(stored) = stored else {
        return Ok(None);
    };

    let bytes = if is_encrypted_payload(stored) {
        decrypt_bytes(key, field.aad(user_id).as_bytes(), stored)?
    } else {
        stored.to_vec()
    };

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| CryptoError::DecryptionFailed(format!("Invalid UTF-8: {}", e)))
}
