use super::schema::AutoRedeemConfig;
use crate::money::Amount;
use crate::retention::CategoryRule;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `explicit` if given, else from default locations, then
    /// apply environment overrides and validate.
    pub async fn load(explicit: Option<&Path>) -> Result<AutoRedeemConfig, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path).await?,
            None => Self::load_default().await?,
        };
        apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
        validate(&config)?;
        Ok(config)
    }

    /// Load from default locations:
    /// 1. ./autoredeem.yaml
    /// 2. ~/.autoredeem/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<AutoRedeemConfig, ConfigError> {
        let local_config = PathBuf::from("./autoredeem.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".autoredeem").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(AutoRedeemConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<AutoRedeemConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AutoRedeemConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Environment variables recognized on top of the config file.
pub const ENV_USER_DATA_DIR: &str = "POSH_USER_DATA_DIR";
pub const ENV_MIN_TRANSFER: &str = "POSH_MIN_TRANSFER";
pub const ENV_HEADLESS: &str = "HEADLESS";
pub const ENV_LOG_DIR: &str = "LOG_DIR";
pub const ENV_LOG_RETENTION_DAYS: &str = "LOG_RETENTION_DAYS";
pub const ENV_SCREENSHOT_RETENTION_DAYS: &str = "SCREENSHOT_RETENTION_DAYS";
pub const ENV_ERROR_RETENTION_DAYS: &str = "ERROR_RETENTION_DAYS";
pub const ENV_SUCCESS_RETENTION_COUNT: &str = "SUCCESS_RETENTION_COUNT";

/// Overlay environment values read through `lookup` onto `config`.
pub fn apply_env_overrides<F>(config: &mut AutoRedeemConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup(ENV_USER_DATA_DIR) {
        config.browser.user_data_dir = PathBuf::from(dir);
    }
    if let Some(value) = lookup(ENV_MIN_TRANSFER) {
        let dollars: f64 = parse_env(ENV_MIN_TRANSFER, &value)?;
        if dollars < 0.0 {
            return Err(ConfigError::InvalidEnv {
                var: ENV_MIN_TRANSFER,
                value,
            });
        }
        config.transfer.min_transfer = Amount::from_dollars(dollars);
    }
    if let Some(value) = lookup(ENV_HEADLESS) {
        config.browser.headless = parse_flag(ENV_HEADLESS, &value)?;
    }
    if let Some(dir) = lookup(ENV_LOG_DIR) {
        config.artifacts.log_dir = PathBuf::from(dir);
    }
    if let Some(value) = lookup(ENV_LOG_RETENTION_DAYS) {
        config.retention.log = CategoryRule::max_age(parse_env(ENV_LOG_RETENTION_DAYS, &value)?);
    }
    if let Some(value) = lookup(ENV_SCREENSHOT_RETENTION_DAYS) {
        config.retention.other =
            CategoryRule::max_age(parse_env(ENV_SCREENSHOT_RETENTION_DAYS, &value)?);
    }
    if let Some(value) = lookup(ENV_ERROR_RETENTION_DAYS) {
        config.retention.error =
            CategoryRule::max_age(parse_env(ENV_ERROR_RETENTION_DAYS, &value)?);
    }
    if let Some(value) = lookup(ENV_SUCCESS_RETENTION_COUNT) {
        config.retention.success =
            CategoryRule::keep_latest(parse_env(ENV_SUCCESS_RETENTION_COUNT, &value)?);
    }
    Ok(())
}

pub fn validate(config: &AutoRedeemConfig) -> Result<(), ConfigError> {
    if config.overlay.max_attempts == 0 {
        return Err(ConfigError::Invalid(
            "overlay.max_attempts must be > 0".into(),
        ));
    }
    if config.timeouts.navigation_secs == 0 {
        return Err(ConfigError::Invalid(
            "timeouts.navigation_secs must be > 0".into(),
        ));
    }
    if config.site.payout_url.trim().is_empty() {
        return Err(ConfigError::Invalid("site.payout_url must be set".into()));
    }
    let tables = &config.strategies;
    for (name, table) in [
        ("payout_method", &tables.payout_method),
        ("continue_button", &tables.continue_button),
        ("redeem_button", &tables.redeem_button),
    ] {
        if table.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "strategies.{} must not be empty",
                name
            )));
        }
    }
    Ok(())
}

fn parse_env<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

/// `HEADLESS=1` style flags.
fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: value.to_string(),
        }),
    }
}
