use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `api_base_url`
pub const API_URL_ENV: &str = "TASKIN_API_URL";

/// Upper bound for `early_reminder_minutes` (one week)
pub const MAX_EARLY_REMINDER_MINUTES: i64 = 7 * 24 * 60;

/// Settings stored in config.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the task store, without trailing slash
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// How long before the due date the early reminder fires
    pub early_reminder_minutes: i64,
    /// Delay between completing a task and deleting it
    pub auto_delete_delay_ms: u64,
    /// Fallback tracing filter when RUST_LOG is unset
    pub log_level: String,
    pub presentation: Presentation,
}

/// How delivered reminders are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Presentation {
    pub show_alert: bool,
    pub play_sound: bool,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            show_alert: true,
            play_sound: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 10,
            early_reminder_minutes: 15,
            auto_delete_delay_ms: 3000,
            log_level: "info".to_string(),
            presentation: Presentation::default(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn auto_delete_delay(&self) -> Duration {
        Duration::from_millis(self.auto_delete_delay_ms)
    }

    /// Early reminder lead, clamped to `0..=MAX_EARLY_REMINDER_MINUTES`
    pub fn early_reminder_lead(&self) -> chrono::Duration {
        let minutes = self.early_reminder_minutes.clamp(0, MAX_EARLY_REMINDER_MINUTES);
        chrono::Duration::try_minutes(minutes).unwrap_or_default()
    }

    /// Apply environment overrides
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
        self
    }

    /// Reject settings the client cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            anyhow::bail!("api_base_url must start with http:// or https://, got {}", self.api_base_url);
        }
        if !(0..=MAX_EARLY_REMINDER_MINUTES).contains(&self.early_reminder_minutes) {
            anyhow::bail!(
                "early_reminder_minutes must be between 0 and {}, got {}",
                MAX_EARLY_REMINDER_MINUTES,
                self.early_reminder_minutes
            );
        }
        Ok(())
    }
}

/// Load config from a config.toml file; a missing file yields defaults
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Invalid config: {}", path.display()))?;
    Ok(config)
}

/// Save config to a config.toml file
pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    super::files::atomic_write(path, &content)?;
    Ok(())
}
