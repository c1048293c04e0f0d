// Studio configuration
// Layered: built-in defaults, then an optional TOML file, then environment

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::polling::PollPolicy;
use crate::models::GenerationKind;

const CONFIG_DIR_NAME: &str = "pigeon-studio";
const CONFIG_FILE_NAME: &str = "config.toml";

const ENV_CONFIG_PATH: &str = "PIGEON_CONFIG_PATH";
const ENV_GATEWAY_ENDPOINT: &str = "PIGEON_GATEWAY_ENDPOINT";
const ENV_POLL_INTERVAL: &str = "PIGEON_POLL_INTERVAL_SECS";
const ENV_POLL_MAX_ATTEMPTS: &str = "PIGEON_POLL_MAX_ATTEMPTS";
/// Checked in order; the first non-empty value wins
pub const ENV_API_KEYS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Model id used for each generation kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCatalog {
    pub text: String,
    pub image: String,
    pub speech: String,
    pub video: String,
    pub search: String,
    pub transcription: String,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            text: "gemini-3-flash-preview".to_string(),
            image: "gemini-2.5-flash-image".to_string(),
            speech: "gemini-2.5-flash-preview-tts".to_string(),
            video: "veo-3.1-fast-generate-preview".to_string(),
            search: "gemini-3-flash-preview".to_string(),
            transcription: "gemini-3-flash-preview".to_string(),
        }
    }
}

impl ModelCatalog {
    pub fn model_for(&self, kind: GenerationKind) -> &str {
        match kind {
            GenerationKind::Text => &self.text,
            GenerationKind::Image => &self.image,
            GenerationKind::Audio => &self.speech,
            GenerationKind::Video => &self.video,
            GenerationKind::SearchGrounded => &self.search,
            GenerationKind::Transcription => &self.transcription,
        }
    }
}

/// Connection settings for the generation gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub models: ModelCatalog,
    /// Per-HTTP-call timeout for status checks and downloads. Submissions are
    /// never timed out.
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            models: ModelCatalog::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Everything the generation core needs at startup
#[derive(Debug, Clone, Default)]
pub struct StudioConfig {
    pub gateway: GatewayConfig,
    pub poll: PollPolicy,
    api_key: Option<String>,
}

impl StudioConfig {
    /// Load defaults, then the config file (if any), then `.env` and the
    /// process environment.
    pub fn load() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        if let Some(path) = config_file_path() {
            if path.exists() {
                config.apply_partial(read_partial(&path)?);
            }
        }
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Load from an explicit file, skipping environment overrides
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::default();
        config.apply_partial(read_partial(path)?);
        Ok(config)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(endpoint) = partial.endpoint {
            self.gateway.endpoint = endpoint;
        }
        if let Some(models) = partial.models {
            self.gateway.models = models;
        }
        if let Some(secs) = partial.request_timeout_secs {
            self.gateway.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = partial.poll_interval_secs {
            self.poll.interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = partial.poll_max_attempts {
            self.poll.max_attempts = attempts;
        }
        if let Some(key) = partial.api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_GATEWAY_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.gateway.endpoint = value;
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL).filter(|v| !v.trim().is_empty()) {
            let secs = parse_number::<u64>(ENV_POLL_INTERVAL, &value)?;
            self.poll.interval = Duration::from_secs(secs);
        }
        if let Some(value) = lookup(ENV_POLL_MAX_ATTEMPTS).filter(|v| !v.trim().is_empty()) {
            self.poll.max_attempts = parse_number::<u32>(ENV_POLL_MAX_ATTEMPTS, &value)?;
        }
        if let Some(key) = ENV_API_KEYS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|v| !v.trim().is_empty())
        {
            self.api_key = Some(key);
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn config_file_path() -> Option<PathBuf> {
    match env::var_os(ENV_CONFIG_PATH) {
        Some(value) if !value.is_empty() => {
            let path = PathBuf::from(value);
            if path.is_dir() {
                Some(path.join(CONFIG_FILE_NAME))
            } else {
                Some(path)
            }
        }
        _ => StudioConfig::default_config_path(),
    }
}

fn read_partial(path: &Path) -> ConfigResult<PartialConfig> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "snake_case")]
struct PartialConfig {
    endpoint: Option<String>,
    models: Option<ModelCatalog>,
    request_timeout_secs: Option<u64>,
    poll_interval_secs: Option<u64>,
    poll_max_attempts: Option<u32>,
    api_key: Option<String>,
}
