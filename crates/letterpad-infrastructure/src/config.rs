//! Application configuration.
//!
//! Loaded from `letterpad.toml` (default: `~/.letterpad/letterpad.toml`).
//! Secrets may be supplied through environment variables instead of the
//! file; an env value always wins.

use letterpad_core::error::{LetterpadError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const API_KEY_ENV: &str = "LETTERPAD_API_KEY";
const OAUTH_SECRET_ENV: &str = "LETTERPAD_OAUTH_CLIENT_SECRET";
const REFRESH_TOKEN_ENV: &str = "LETTERPAD_GOOGLE_REFRESH_TOKEN";

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AppConfig {
    pub identity: IdentityConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Identity provider endpoints and credentials.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct IdentityConfig {
    /// Provider API key appended to auth endpoint calls
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,
    #[serde(default = "default_token_base_url")]
    pub token_base_url: String,
    #[serde(default = "default_oauth_token_url")]
    pub oauth_token_url: String,
    /// OAuth client for the drive-scoped consent/offline flow
    #[serde(default)]
    pub oauth_client_id: Option<String>,
    #[serde(default)]
    pub oauth_client_secret: Option<String>,
    /// Offline refresh token obtained from a one-time consent grant
    #[serde(default)]
    pub google_refresh_token: Option<String>,
}

/// Cloud drive REST endpoints.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DriveConfig {
    #[serde(default = "default_drive_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_drive_upload_base_url")]
    pub upload_base_url: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_drive_api_base_url(),
            upload_base_url: default_drive_upload_base_url(),
        }
    }
}

/// Document store endpoint.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DocumentsConfig {
    pub base_url: String,
}

/// Local durable storage location.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct StorageConfig {
    /// Overrides the default `~/.letterpad/storage.json`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_auth_base_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_token_base_url() -> String {
    "https://securetoken.googleapis.com/v1".to_string()
}

fn default_oauth_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_drive_api_base_url() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_drive_upload_base_url() -> String {
    "https://www.googleapis.com/upload/drive/v3".to_string()
}

impl AppConfig {
    /// Loads the configuration from `path`, or from the default location
    /// when `path` is `None`, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => dirs::home_dir()
                .ok_or_else(|| LetterpadError::config("failed to get home directory"))?
                .join(".letterpad")
                .join("letterpad.toml"),
        };

        let raw = fs::read_to_string(&path).map_err(|e| {
            LetterpadError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        let mut config: AppConfig = toml::from_str(&raw)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.identity.api_key = key;
        }
        if let Ok(secret) = std::env::var(OAUTH_SECRET_ENV) {
            self.identity.oauth_client_secret = Some(secret);
        }
        if let Ok(token) = std::env::var(REFRESH_TOKEN_ENV) {
            self.identity.google_refresh_token = Some(token);
        }
    }
}
