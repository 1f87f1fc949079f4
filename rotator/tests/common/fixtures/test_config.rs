//! Test configuration builder for creating config directories and in-memory configs

use rotator::{Config, RetentionPolicy};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// In-memory config pointing at `api_endpoint` with the given exclusions and retention
pub fn config_with(api_endpoint: &str, excluded: &[&str], retention: RetentionPolicy) -> Arc<Config> {
    Arc::new(Config {
        region: super::mock_cloud::REGION.to_string(),
        api_endpoint: api_endpoint.to_string(),
        timezone: "UTC".to_string(),
        request_timeout_seconds: Some(5),
        retention,
        excluded_instances: excluded.iter().map(|s| s.to_string()).collect(),
        api_key: None,
    })
}

/// Builder for config directories on disk
pub struct TestConfigBuilder {
    temp_dir: TempDir,
    main_toml: String,
    secrets_toml: Option<String>,
    fragments: Vec<(String, String)>,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            main_toml: r#"
region = "eu-west-1"
api_endpoint = "https://compute.example.net"
"#
            .to_string(),
            secrets_toml: None,
            fragments: Vec::new(),
        }
    }

    pub fn main(mut self, toml: &str) -> Self {
        self.main_toml = toml.to_string();
        self
    }

    pub fn secrets(mut self, toml: &str) -> Self {
        self.secrets_toml = Some(toml.to_string());
        self
    }

    /// Add an exclusion fragment file `<name>.toml`
    pub fn fragment(mut self, name: &str, toml: &str) -> Self {
        self.fragments.push((name.to_string(), toml.to_string()));
        self
    }

    /// Skip main.toml entirely
    pub fn without_main(mut self) -> Self {
        self.main_toml.clear();
        self
    }

    pub fn build(self) -> TestConfig {
        let config_dir = self.temp_dir.path().join("config");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        if !self.main_toml.is_empty() {
            fs::write(config_dir.join("main.toml"), &self.main_toml).expect("Failed to write main.toml");
        }

        if let Some(secrets) = &self.secrets_toml {
            fs::write(config_dir.join("secrets.toml"), secrets).expect("Failed to write secrets.toml");
        }

        for (name, content) in &self.fragments {
            fs::write(config_dir.join(format!("{}.toml", name)), content)
                .expect("Failed to write fragment");
        }

        TestConfig {
            _temp_dir: self.temp_dir,
            config_dir,
        }
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Config directory that lives as long as this value
pub struct TestConfig {
    _temp_dir: TempDir,
    config_dir: PathBuf,
}

impl TestConfig {
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}
