// File: rotator/src/config/manager.rs
use glob::glob;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

use super::secrets::SecretsLoader;
use super::{Config, ExclusionFile};
use crate::errors::ConfigError;

const MAIN_CONFIG: &str = "main.toml";
const SECRETS_CONFIG: &str = "secrets.toml";

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load_configuration(config_dir.as_ref()).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &Path) -> Result<Config, ConfigError> {
        let main_config_path = config_dir.join(MAIN_CONFIG);
        let main_config_content = read(&main_config_path).await?;

        let mut config: Config =
            toml::from_str(&main_config_content).map_err(|e| ConfigError::ParseError {
                path: main_config_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let secrets = SecretsLoader::load(&config_dir.join(SECRETS_CONFIG))?;
        config.api_key = secrets.api_key().map(str::to_string);

        // Every other *.toml next to main.toml contributes exclusions
        let mut excluded = config.excluded_instances.clone();
        for path in Self::exclusion_fragments(config_dir)? {
            debug!("Loading exclusion fragment: {}", path.display());

            let content = read(&path).await?;
            let fragment: ExclusionFile =
                toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;

            excluded.extend(fragment.excluded_instances);
        }

        let mut seen = HashSet::new();
        excluded.retain(|name| seen.insert(name.clone()));
        config.excluded_instances = excluded;

        config.validate()?;

        info!(
            "Loaded configuration for region {}: {} excluded instances, retention {}d/{}w/{}m",
            config.region,
            config.excluded_instances.len(),
            config.retention.daily,
            config.retention.weekly,
            config.retention.monthly
        );

        Ok(config)
    }

    fn exclusion_fragments(config_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        let pattern = config_dir.join("*.toml");
        let pattern = pattern.to_string_lossy();

        let entries = glob(&pattern).map_err(|e| ConfigError::LoadFailed {
            path: pattern.to_string(),
            reason: format!("Glob pattern error: {}", e),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ConfigError::LoadFailed {
                path: e.path().display().to_string(),
                reason: format!("Glob entry error: {}", e),
            })?;

            let filename = path.file_name().and_then(|name| name.to_str());
            if matches!(filename, Some(MAIN_CONFIG) | Some(SECRETS_CONFIG)) {
                continue;
            }
            paths.push(path);
        }

        paths.sort();
        Ok(paths)
    }
}

async fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}
