// Crypto Service
// AES-256-GCM sealing for the stored studio key, keyed from machine identity

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Digest;
use thiserror::Error;

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;
const STUDIO_SALT: &[u8] = b"PigeonStudio-Key-Sealing-v1";

/// Sealed value as written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    /// Base64 encoded nonce
    pub nonce: String,
    /// Base64 encoded ciphertext
    pub ciphertext: String,
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Decryption error: {0}")]
    DecryptionError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Symmetric cipher bound to one derived key
#[derive(Clone)]
pub struct StudioCipher {
    key: [u8; KEY_SIZE],
}

impl std::fmt::Debug for StudioCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioCipher").finish_non_exhaustive()
    }
}

impl StudioCipher {
    /// Key derived from this machine's hostname and user, stable across runs
    pub fn for_this_machine() -> Self {
        Self::from_identity(&machine_identity())
    }

    pub fn from_identity(identity: &str) -> Self {
        let mut hasher = sha2::Sha256::new();
        hasher.update(STUDIO_SALT);
        hasher.update(identity.as_bytes());
        hasher.update(STUDIO_SALT);

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&hasher.finalize());
        Self { key }
    }

    fn cipher(&self) -> CryptoResult<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| CryptoError::EncryptionError(format!("Failed to create cipher: {}", e)))
    }

    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<EncryptedData> {
        let cipher = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionError(format!("Encryption failed: {}", e)))?;

        Ok(EncryptedData {
            nonce: BASE64.encode(nonce_bytes),
            ciphertext: BASE64.encode(ciphertext),
        })
    }

    pub fn decrypt(&self, sealed: &EncryptedData) -> CryptoResult<String> {
        let cipher = self.cipher()?;

        let nonce_bytes = BASE64
            .decode(&sealed.nonce)
            .map_err(|e| CryptoError::InvalidData(format!("Invalid nonce: {}", e)))?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidData(format!(
                "Invalid nonce size: expected {}, got {}",
                NONCE_SIZE,
                nonce_bytes.len()
            )));
        }

        let ciphertext = BASE64
            .decode(&sealed.ciphertext)
            .map_err(|e| CryptoError::InvalidData(format!("Invalid ciphertext: {}", e)))?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|e| CryptoError::DecryptionError(format!("Decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| CryptoError::DecryptionError(format!("Invalid UTF-8: {}", e)))
    }
}

fn machine_identity() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown-host".to_string());
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown-user".to_string());
    format!("{}-{}", host, user)
}
