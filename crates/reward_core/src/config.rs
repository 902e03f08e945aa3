//! Reward engine configuration
//!
//! Defaults match production. A JSON file may override any field, and a small set of
//! environment variables override the file.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Canonical env var for the card master table path.
pub const CATALOG_PATH_ENV: &str = "CARD_MASTER_PATH";

/// Default relative path used when `CARD_MASTER_PATH` is not set.
pub const DEFAULT_CATALOG_REL_PATH: &str = "data/card_master.csv";

pub const LOTTERY_ENABLED_ENV: &str = "REWARD_LOTTERY_ENABLED";
pub const DEDUP_WINDOW_ENV: &str = "REWARD_DEDUP_WINDOW_SECS";
pub const NOTIFY_ATTEMPTS_ENV: &str = "REWARD_NOTIFY_MAX_ATTEMPTS";
pub const NOTIFY_BACKOFF_ENV: &str = "REWARD_NOTIFY_BACKOFF_MS";

/// Titles last exactly one week.
pub const TITLE_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub queue_capacity: usize,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { max_attempts: 3, backoff_ms: 500, queue_capacity: 256 }
    }
}

impl NotificationSettings {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Jackpot draw switch. Off in production; rewards are granted either way.
    pub lottery_enabled: bool,
    pub dedup_window_secs: u64,
    pub title_ttl_days: i64,
    pub catalog_path: PathBuf,
    pub notification: NotificationSettings,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            lottery_enabled: false,
            dedup_window_secs: 10,
            title_ttl_days: TITLE_TTL_DAYS,
            catalog_path: PathBuf::from(DEFAULT_CATALOG_REL_PATH),
            notification: NotificationSettings::default(),
        }
    }
}

impl RewardConfig {
    /// Load config from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse config from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RewardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides. Unparseable values keep the current setting.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = env_path(CATALOG_PATH_ENV) {
            self.catalog_path = path;
        }
        override_from_env(LOTTERY_ENABLED_ENV, &mut self.lottery_enabled);
        override_from_env(DEDUP_WINDOW_ENV, &mut self.dedup_window_secs);
        override_from_env(NOTIFY_ATTEMPTS_ENV, &mut self.notification.max_attempts);
        override_from_env(NOTIFY_BACKOFF_ENV, &mut self.notification.backoff_ms);
        self
    }

    /// Validate configuration bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=300).contains(&self.dedup_window_secs) {
            return Err(ConfigError::Validation(format!(
                "dedup_window_secs must be 1-300, got {}",
                self.dedup_window_secs
            )));
        }
        if self.title_ttl_days != TITLE_TTL_DAYS {
            return Err(ConfigError::Validation(format!(
                "title_ttl_days must be {}, got {}",
                TITLE_TTL_DAYS, self.title_ttl_days
            )));
        }
        if !(1..=10).contains(&self.notification.max_attempts) {
            return Err(ConfigError::Validation(format!(
                "notification.max_attempts must be 1-10, got {}",
                self.notification.max_attempts
            )));
        }
        if self.notification.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "notification.queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn dedup_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.dedup_window_secs as i64)
    }

    pub fn title_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.title_ttl_days)
    }
}

/// Card master path: `CARD_MASTER_PATH` if set, otherwise the default relative path.
pub fn resolve_catalog_path() -> PathBuf {
    env_path(CATALOG_PATH_ENV).unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_REL_PATH))
}

fn env_path(key: &str) -> Option<PathBuf> {
    let raw = env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

fn override_from_env<T>(key: &str, target: &mut T)
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Ok(raw) = env::var(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => {
            info!("{key} set, using {value}");
            *target = value;
        }
        Err(e) => warn!("Invalid {key} value '{raw}': {e}, keeping {target}"),
    }
}
