use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Environment variables that override values from the YAML file.
pub const ENV_POSTGRES_URL: &str = "DEMO_BANK_POSTGRES_URL";
pub const ENV_TOKEN_SYMMETRIC_KEY: &str = "DEMO_BANK_TOKEN_SYMMETRIC_KEY";
pub const ENV_PORT: &str = "DEMO_BANK_PORT";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    pub postgres_url: String,
    /// At least 32 bytes.
    pub token_symmetric_key: String,
    #[serde(default = "default_access_token_duration_secs")]
    pub access_token_duration_secs: u64,
    /// 0 disables the transfer deadline.
    #[serde(default)]
    pub transfer_timeout_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

fn default_access_token_duration_secs() -> u64 {
    15 * 60
}

impl AppConfig {
    /// Load `config/<env>.yaml`, then apply environment overrides.
    pub fn load(env: &str) -> Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config yaml")
    }

    /// Apply overrides looked up through `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_POSTGRES_URL) {
            self.postgres_url = url;
        }
        if let Some(key) = lookup(ENV_TOKEN_SYMMETRIC_KEY) {
            self.token_symmetric_key = key;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.gateway.port = port
                .parse()
                .with_context(|| format!("{} is not a valid port: {}", ENV_PORT, port))?;
        }
        Ok(())
    }

    pub fn access_token_duration(&self) -> Duration {
        Duration::from_secs(self.access_token_duration_secs)
    }

    pub fn transfer_timeout(&self) -> Option<Duration> {
        (self.transfer_timeout_ms > 0).then(|| Duration::from_millis(self.transfer_timeout_ms))
    }
}
