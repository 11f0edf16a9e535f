//! Environment-based Configuration
//!
//! Loads the default settings-registry values from environment variables.
//! Deployments drive the core through an external settings registry; this
//! loader covers standalone and test wiring.
//!
//! # Environment Variables
//!
//! - `POOL_LOG_LEVEL` - logging level (default: "info")
//! - `POOL_LOG_JSON` - set to "1" for JSON log output
//! - `POOL_MIN_DEPOSIT_WEI` - minimum deposit (default: 1 gwei)
//! - `POOL_CHUNK_SIZE_WEI` - matching chunk size (default: 4 ETH)
//! - `POOL_DURATIONS` - comma list of `duration:max_deposit_wei` pairs,
//!   e.g. `3m:16000000000000000000,6m:16000000000000000000`

use std::env;

use thiserror::Error;

use crate::settings::StaticSettings;
use crate::types::ids::{Amount, DurationId};
use crate::units::{eth_to_wei, WEI_PER_ETH};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Loaded configuration for standalone wiring
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Logging level name
    pub log_level: String,
    /// JSON log output
    pub log_json: bool,
    /// Minimum deposit in wei
    pub min_deposit: Amount,
    /// Matching chunk size in wei
    pub chunk_size: Amount,
    /// Recognised durations and their deposit caps
    pub durations: Vec<(DurationId, Amount)>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            min_deposit: WEI_PER_ETH / 1_000_000_000,
            chunk_size: eth_to_wei(4),
            durations: vec![
                (DurationId::from("3m"), eth_to_wei(16)),
                (DurationId::from("6m"), eth_to_wei(16)),
                (DurationId::from("12m"), eth_to_wei(16)),
            ],
        }
    }
}

impl PoolConfig {
    /// Load configuration from the environment, falling back to defaults.
    /// A `.env` file is honoured when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let log_level = env::var("POOL_LOG_LEVEL").unwrap_or(defaults.log_level);
        let log_json = env::var("POOL_LOG_JSON").map(|v| v == "1").unwrap_or(false);

        let min_deposit = match env::var("POOL_MIN_DEPOSIT_WEI") {
            Ok(raw) => parse_amount("POOL_MIN_DEPOSIT_WEI", &raw)?,
            Err(_) => defaults.min_deposit,
        };
        let chunk_size = match env::var("POOL_CHUNK_SIZE_WEI") {
            Ok(raw) => parse_amount("POOL_CHUNK_SIZE_WEI", &raw)?,
            Err(_) => defaults.chunk_size,
        };
        let durations = match env::var("POOL_DURATIONS") {
            Ok(raw) => parse_durations(&raw)?,
            Err(_) => defaults.durations,
        };

        Ok(Self {
            log_level,
            log_json,
            min_deposit,
            chunk_size,
            durations,
        })
    }

    /// Build the default settings registry from this configuration
    pub fn build_settings(&self) -> StaticSettings {
        let mut settings = StaticSettings::new(self.min_deposit, self.chunk_size);
        for (duration, max) in &self.durations {
            settings = settings.with_duration(duration.clone(), *max);
        }
        settings
    }
}

fn parse_amount(var: &str, raw: &str) -> Result<Amount, ConfigError> {
    raw.trim()
        .parse::<Amount>()
        .map_err(|e| ConfigError::InvalidValue(var.to_string(), e.to_string()))
}

/// Parse `duration:max_wei` pairs separated by commas
fn parse_durations(raw: &str) -> Result<Vec<(DurationId, Amount)>, ConfigError> {
    let mut durations = Vec::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, max) = pair.split_once(':').ok_or_else(|| {
            ConfigError::InvalidValue(
                "POOL_DURATIONS".to_string(),
                format!("expected duration:max_wei, got {}", pair),
            )
        })?;
        durations.push((
            DurationId::from(name.trim()),
            parse_amount("POOL_DURATIONS", max)?,
        ));
    }
    if durations.is_empty() {
        return Err(ConfigError::InvalidValue(
            "POOL_DURATIONS".to_string(),
            "no durations configured".to_string(),
        ));
    }
    Ok(durations)
}
