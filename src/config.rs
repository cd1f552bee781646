use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::ThrottleConfig;

/// Persisted application configuration: account credentials for both
/// environments plus tuning knobs for the migration engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub production_host: String,
    #[serde(default)]
    pub sandbox_host: String,
    #[serde(default)]
    pub production_api_key: String,
    #[serde(default)]
    pub sandbox_api_key: String,
    #[serde(default)]
    pub theme_directory: Option<PathBuf>,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_min_request_delay_ms")]
    pub min_request_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_throttle_enabled")]
    pub throttle_enabled: bool,
}

fn default_min_request_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_throttle_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_request_delay_ms: default_min_request_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            throttle_enabled: default_throttle_enabled(),
        }
    }
}

impl Settings {
    pub fn throttle_config(&self) -> ThrottleConfig {
        ThrottleConfig {
            min_delay: Duration::from_millis(self.min_request_delay_ms),
            enabled: self.throttle_enabled,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // Use XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("zentools-cli")
        } else {
            // Use home directory with dot prefix on Windows/Mac
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".zentools-cli")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using default config");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        debug!("Saving config to: {:?}", config_path);

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// Setting names accepted by `get_value`/`set_value`.
    pub fn setting_names() -> &'static [&'static str] {
        &[
            "email",
            "production-host",
            "sandbox-host",
            "production-api-key",
            "sandbox-api-key",
            "theme-directory",
            "min-request-delay-ms",
            "request-timeout-secs",
            "throttle-enabled",
        ]
    }

    pub fn get_value(&self, name: &str) -> Result<String> {
        let value = match name {
            "email" => self.email.clone(),
            "production-host" => self.production_host.clone(),
            "sandbox-host" => self.sandbox_host.clone(),
            "production-api-key" => self.production_api_key.clone(),
            "sandbox-api-key" => self.sandbox_api_key.clone(),
            "theme-directory" => self
                .theme_directory
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            "min-request-delay-ms" => self.settings.min_request_delay_ms.to_string(),
            "request-timeout-secs" => self.settings.request_timeout_secs.to_string(),
            "throttle-enabled" => self.settings.throttle_enabled.to_string(),
            _ => anyhow::bail!(
                "Unknown setting '{}'. Valid settings: {}",
                name,
                Self::setting_names().join(", ")
            ),
        };
        Ok(value)
    }

    pub fn set_value(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "email" => self.email = value.to_string(),
            "production-host" => self.production_host = value.to_string(),
            "sandbox-host" => self.sandbox_host = value.to_string(),
            "production-api-key" => self.production_api_key = value.to_string(),
            "sandbox-api-key" => self.sandbox_api_key = value.to_string(),
            "theme-directory" => self.theme_directory = Some(PathBuf::from(value)),
            "min-request-delay-ms" => {
                self.settings.min_request_delay_ms = value
                    .parse()
                    .with_context(|| format!("'{}' is not a valid millisecond count", value))?;
            }
            "request-timeout-secs" => {
                self.settings.request_timeout_secs = value
                    .parse()
                    .with_context(|| format!("'{}' is not a valid second count", value))?;
            }
            "throttle-enabled" => {
                self.settings.throttle_enabled = value
                    .parse()
                    .with_context(|| format!("'{}' is not a valid boolean", value))?;
            }
            _ => anyhow::bail!(
                "Unknown setting '{}'. Valid settings: {}",
                name,
                Self::setting_names().join(", ")
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.settings.min_request_delay_ms, 1000);
        assert_eq!(config.settings.request_timeout_secs, 30);
        assert!(config.settings.throttle_enabled);
        assert!(config.email.is_empty());
    }

    #[test]
    fn set_and_get_values_round_trip() {
        let mut config = Config::default();
        config.set_value("email", "agent@example.com").unwrap();
        config.set_value("min-request-delay-ms", "250").unwrap();
        config.set_value("throttle-enabled", "false").unwrap();

        assert_eq!(config.get_value("email").unwrap(), "agent@example.com");
        assert_eq!(config.get_value("min-request-delay-ms").unwrap(), "250");
        assert_eq!(config.settings.min_request_delay_ms, 250);
        assert!(!config.settings.throttle_enabled);
    }

    #[test]
    fn unknown_setting_is_rejected() {
        let mut config = Config::default();
        assert!(config.set_value("no-such-setting", "x").is_err());
        assert!(config.get_value("no-such-setting").is_err());
    }

    #[test]
    fn throttle_config_reflects_settings() {
        let mut settings = Settings::default();
        settings.min_request_delay_ms = 500;
        settings.throttle_enabled = false;

        let throttle = settings.throttle_config();
        assert_eq!(throttle.min_delay, Duration::from_millis(500));
        assert!(!throttle.enabled);
    }
}
