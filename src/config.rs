//! Configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::wishlist::StoreSettings;

pub const DEFAULT_NAMESPACE: &str = "decor";
pub const DEFAULT_EXPIRY_DAYS: u64 = 30;
pub const DEFAULT_DATA_DIR: &str = ".wishlist";

const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Where and for how long the wishlist is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistConfig {
    pub namespace: String,
    pub expiry_days: u64,
    pub data_dir: PathBuf,
    pub catalog_path: Option<PathBuf>,
}

impl WishlistConfig {
    /// Build typed wishlist config from environment variables.
    ///
    /// Optional:
    /// - `WISHLIST_NAMESPACE`: storage key prefix, default `decor`
    /// - `WISHLIST_EXPIRY_DAYS`: snapshot lifetime, default 30, must be > 0
    /// - `WISHLIST_DATA_DIR`: file storage directory, default `.wishlist`
    /// - `WISHLIST_CATALOG_PATH`: JSON product catalog
    pub fn from_env() -> Result<Self, ConfigError> {
        let namespace = env_non_empty("WISHLIST_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned());
        if !namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        {
            return Err(ConfigError::Invalid { var: "WISHLIST_NAMESPACE", value: namespace });
        }

        let expiry_days = match env_non_empty("WISHLIST_EXPIRY_DAYS") {
            None => DEFAULT_EXPIRY_DAYS,
            Some(raw) => match raw.parse::<u64>() {
                Ok(days) if days > 0 => days,
                _ => return Err(ConfigError::Invalid { var: "WISHLIST_EXPIRY_DAYS", value: raw }),
            },
        };

        let data_dir = env_non_empty("WISHLIST_DATA_DIR").map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);
        let catalog_path = env_non_empty("WISHLIST_CATALOG_PATH").map(PathBuf::from);

        Ok(Self { namespace, expiry_days, data_dir, catalog_path })
    }

    #[must_use]
    pub fn expiry_window(&self) -> Duration {
        Duration::from_secs(self.expiry_days.saturating_mul(SECS_PER_DAY))
    }

    #[must_use]
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings::for_namespace(&self.namespace).with_expiry_window(self.expiry_window())
    }
}

impl Default for WishlistConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            expiry_days: DEFAULT_EXPIRY_DAYS,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            catalog_path: None,
        }
    }
}

/// Credentials and addresses for the inquiry email channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    pub api_key: String,
    pub from: String,
    pub to: String,
}

impl NotifyConfig {
    /// Required: `RESEND_API_KEY`, `RESEND_FROM`, `WISHLIST_INQUIRY_TO`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_required("RESEND_API_KEY")?,
            from: env_required("RESEND_FROM")?,
            to: env_required("WISHLIST_INQUIRY_TO")?,
        })
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn env_required(var: &'static str) -> Result<String, ConfigError> {
    env_non_empty(var).ok_or(ConfigError::Missing { var })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
