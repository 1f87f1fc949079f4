// File: rotator/src/config/mod.rs
pub mod manager;
pub mod secrets;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub use manager::ConfigManager;

use crate::constants::defaults;
use crate::errors::ConfigError;
use crate::retention::RetentionPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub region: String,
    pub api_endpoint: String,
    /// IANA zone deciding what "today" means for cutoff dates
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub request_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub retention: RetentionPolicy,
    /// Instance `Name` tags never backed up; fragments from other files are merged in
    #[serde(default)]
    pub excluded_instances: Vec<String>,
    // Populated from secrets.toml
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_timezone() -> String {
    defaults::TIMEZONE.to_string()
}

/// Extra exclusions dropped next to main.toml, one file per team or service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExclusionFile {
    #[serde(default)]
    pub excluded_instances: Vec<String>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "region".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.api_endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_endpoint".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        self.tz()?;

        if self.request_timeout_seconds == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_seconds".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.excluded_instances.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "excluded_instances".to_string(),
                reason: "instance names must not be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "timezone".to_string(),
                reason: e.to_string(),
            })
    }

    /// Current calendar date in the configured timezone
    pub fn today(&self) -> Result<NaiveDate, ConfigError> {
        let tz = self.tz()?;
        Ok(Utc::now().with_timezone(&tz).date_naive())
    }
}
