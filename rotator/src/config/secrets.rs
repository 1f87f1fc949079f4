// File: rotator/src/config/secrets.rs
//! Secrets loader for the cloud API key.
//!
//! The key lives in a separate TOML file (config/secrets.toml) that should be
//! excluded from version control.
//!
//! Example secrets.toml:
//! ```toml
//! [cloud]
//! api_key = "secret-api-key"
//! ```

use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::errors::ConfigError;

#[derive(Debug, Deserialize, Default)]
pub struct CloudSecrets {
    pub api_key: Option<String>,
}

/// Structure matching the secrets.toml file format
#[derive(Debug, Deserialize, Default)]
pub struct SecretsFile {
    #[serde(default)]
    pub cloud: CloudSecrets,
}

pub struct SecretsLoader {
    secrets: SecretsFile,
}

impl SecretsLoader {
    /// Load secrets from the specified file path.
    /// Returns an empty loader if the file doesn't exist.
    pub fn load(secrets_path: &Path) -> Result<Self, ConfigError> {
        if !secrets_path.exists() {
            warn!(
                "Secrets file not found at {:?}, cloud requests will be unauthenticated",
                secrets_path
            );
            return Ok(Self {
                secrets: SecretsFile::default(),
            });
        }

        let path = secrets_path.display().to_string();
        let content = std::fs::read_to_string(secrets_path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let secrets: SecretsFile = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            reason: e.to_string(),
        })?;

        info!("Loaded cloud secrets from {:?}", secrets_path);
        Ok(Self { secrets })
    }

    pub fn api_key(&self) -> Option<&str> {
        self.secrets
            .cloud
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}
