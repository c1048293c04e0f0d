// Studio Key Storage
//
// Keeps the studio key sealed on disk with the crypto module, and exposes it
// to the credential gate as a host environment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::{CredentialError, CredentialHost, CredentialResult};
use crate::services::crypto::{EncryptedData, StudioCipher};
use crate::utils::config::ENV_API_KEYS;

const KEY_FILE_NAME: &str = "studio-key.json";
const DATA_DIR_NAME: &str = "pigeon-studio";

/// Encrypted single-key file
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
    cipher: StudioCipher,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>, cipher: StudioCipher) -> Self {
        Self {
            path: path.into(),
            cipher,
        }
    }

    /// Key file under the user data directory, sealed with the machine key
    pub fn in_data_dir() -> CredentialResult<Self> {
        let dir = dirs::data_dir().ok_or_else(|| {
            CredentialError::Storage("Could not determine the user data directory".to_string())
        })?;
        Ok(Self::new(
            dir.join(DATA_DIR_NAME).join(KEY_FILE_NAME),
            StudioCipher::for_this_machine(),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn store(&self, api_key: &str) -> CredentialResult<()> {
        let sealed = self.cipher.encrypt(api_key)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&sealed)
            .map_err(|e| CredentialError::Storage(e.to_string()))?;
        std::fs::write(&self.path, json)?;

        log::info!("[credential] studio key stored at {}", self.path.display());
        Ok(())
    }

    /// The stored key, or None when nothing has been stored
    pub fn load(&self) -> CredentialResult<Option<String>> {
        if !self.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let sealed: EncryptedData = serde_json::from_str(&raw)
            .map_err(|e| CredentialError::Storage(format!("Corrupt key file: {}", e)))?;
        Ok(Some(self.cipher.decrypt(&sealed)?))
    }

    pub fn delete(&self) -> CredentialResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("[credential] studio key deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Source of a key when the user asks to select one
#[async_trait]
pub trait KeyPrompt: Send + Sync {
    /// None when the user closed the selection without choosing
    async fn request_key(&self) -> Option<String>;
}

type Lookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Reads the key from `API_KEY` or `GEMINI_API_KEY`
pub struct EnvKeyPrompt {
    lookup: Box<Lookup>,
}

impl EnvKeyPrompt {
    pub fn new() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl Default for EnvKeyPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyPrompt for EnvKeyPrompt {
    async fn request_key(&self) -> Option<String> {
        ENV_API_KEYS
            .iter()
            .filter_map(|name| (self.lookup)(name))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }
}

/// Host environment backed by the key file
pub struct KeyStoreHost {
    store: KeyStore,
    prompt: Arc<dyn KeyPrompt>,
}

impl KeyStoreHost {
    pub fn new(store: KeyStore, prompt: Arc<dyn KeyPrompt>) -> Self {
        Self { store, prompt }
    }

    pub fn store(&self) -> &KeyStore {
        &self.store
    }
}

#[async_trait]
impl CredentialHost for KeyStoreHost {
    async fn has_selected_key(&self) -> bool {
        match self.store.load() {
            Ok(Some(key)) => !key.trim().is_empty(),
            Ok(None) => false,
            Err(e) => {
                log::warn!("[credential] stored key unreadable: {}", e);
                false
            }
        }
    }

    async fn open_select_key(&self) -> CredentialResult<()> {
        match self.prompt.request_key().await {
            Some(key) => self.store.store(&key),
            None => {
                log::info!("[credential] key selection closed without a key");
                Ok(())
            }
        }
    }
}
