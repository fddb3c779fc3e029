use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const API_BASE_ENV: &str = "QR_STUDIO_API_BASE";

/// Largest background image the upload form accepts (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Origin of the QR rendering service, without a trailing `/api`.
    pub api_base: String,
    pub debounce_ms: u64,
    pub banner_ms: u64,
    pub max_upload_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8000".to_string(),
            debounce_ms: 500,
            banner_ms: 5000,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Location of the optional config file: `<temp>/qr-studio/config.json`.
    pub fn config_path() -> PathBuf {
        env::temp_dir().join("qr-studio").join("config.json")
    }

    /// Loads the config file if one exists, then applies the environment override.
    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::config_path());
        if let Ok(base) = env::var(API_BASE_ENV) {
            if !base.trim().is_empty() {
                config.api_base = base.trim_end_matches('/').to_string();
            }
        }
        config
    }

    /// A missing or unreadable file yields the defaults; the latter is logged.
    pub fn load_from(path: &Path) -> Self {
        let mut config = match Self::read(path) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Ignoring config: {:#}", e);
                Self::default()
            }
        };
        config.api_base = config.api_base.trim_end_matches('/').to_string();
        config
    }

    fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {:?}", path))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("Failed to parse config at {:?}", path))?;
        Ok(Some(config))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
