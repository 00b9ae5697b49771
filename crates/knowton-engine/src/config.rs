//! Bonding service configuration.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use knowton_bonds::TrancheSplit;
use knowton_core::{KnowtonError, KnowtonResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

/// Environment variable overriding the oracle base URL.
pub const ENV_ORACLE_URL: &str = "KNOWTON_ORACLE_URL";

/// Environment variable overriding the storage path.
pub const ENV_STORAGE_PATH: &str = "KNOWTON_STORAGE_PATH";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondingConfig {
    /// Timeout of a single ledger call, in milliseconds.
    #[serde(default = "default_ledger_timeout_ms")]
    pub ledger_timeout_ms: u64,

    /// Path of the redb database.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,

    /// Tranche allocation split applied to every issuance.
    #[serde(default)]
    pub split: TrancheSplit,

    /// Ledger retry policy.
    #[serde(default)]
    pub retry: RetrySettings,

    /// Valuation oracle.
    #[serde(default)]
    pub oracle: OracleSettings,

    /// Creator reputation factors keyed by address.
    #[serde(default)]
    pub reputation: BTreeMap<String, Decimal>,
}

/// Retry settings in serializable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Delay cap, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Exponential backoff factor.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Add up to 25% random jitter.
    #[serde(default = "default_true")]
    pub jitter: bool,
}

/// Valuation oracle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleSettings {
    /// Use the oracle (with rule-based fallback) instead of rules only.
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the oracle service.
    #[serde(default = "default_oracle_url")]
    pub base_url: String,
    /// Request timeout, in milliseconds.
    #[serde(default = "default_oracle_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_ledger_timeout_ms() -> u64 {
    30_000
}

fn default_storage_path() -> String {
    "./data/knowton.redb".to_string()
}

fn default_max_attempts() -> u32 {
    4
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_oracle_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_oracle_timeout_ms() -> u64 {
    30_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetrySettings {
    /// Runtime retry policy.
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
            jitter: self.jitter,
        }
    }
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_oracle_url(),
            timeout_ms: default_oracle_timeout_ms(),
        }
    }
}

impl OracleSettings {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BondingConfig {
    fn default() -> Self {
        Self {
            split: TrancheSplit::STANDARD,
            retry: RetrySettings::default(),
            ledger_timeout_ms: default_ledger_timeout_ms(),
            oracle: OracleSettings::default(),
            storage_path: default_storage_path(),
            reputation: BTreeMap::new(),
        }
    }
}

impl BondingConfig {
    /// Settings for tests: retries without delay, short timeouts.
    pub fn minimal() -> Self {
        Self {
            retry: RetrySettings {
                max_attempts: 3,
                initial_delay_ms: 0,
                max_delay_ms: 0,
                backoff_multiplier: 1.0,
                jitter: false,
            },
            ledger_timeout_ms: 1_000,
            oracle: OracleSettings {
                timeout_ms: 1_000,
                ..OracleSettings::default()
            },
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> KnowtonResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            KnowtonError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML.
    pub fn from_toml(content: &str) -> KnowtonResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| KnowtonError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> KnowtonResult<String> {
        toml::to_string_pretty(self).map_err(|e| KnowtonError::config(e.to_string()))
    }

    /// Applies `KNOWTON_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_ORACLE_URL) {
            if !url.is_empty() {
                self.oracle.base_url = url;
            }
        }
        if let Ok(path) = std::env::var(ENV_STORAGE_PATH) {
            if !path.is_empty() {
                self.storage_path = path;
            }
        }
        self
    }

    /// Checks value ranges. The split validates itself on deserialization.
    pub fn validate(&self) -> KnowtonResult<()> {
        if self.retry.max_attempts == 0 {
            return Err(KnowtonError::config("retry.max_attempts must be at least 1"));
        }
        if self.retry.backoff_multiplier < 1.0 || !self.retry.backoff_multiplier.is_finite() {
            return Err(KnowtonError::config(format!(
                "retry.backoff_multiplier must be >= 1, got {}",
                self.retry.backoff_multiplier
            )));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(KnowtonError::config(
                "retry.initial_delay_ms must not exceed retry.max_delay_ms",
            ));
        }
        if self.ledger_timeout_ms == 0 {
            return Err(KnowtonError::config("ledger_timeout_ms must be positive"));
        }
        if self.oracle.enabled {
            if self.oracle.base_url.trim().is_empty() {
                return Err(KnowtonError::config("oracle.base_url is required"));
            }
            if self.oracle.timeout_ms == 0 {
                return Err(KnowtonError::config("oracle.timeout_ms must be positive"));
            }
        }
        if let Some((creator, factor)) = self.reputation.iter().find(|(_, f)| **f <= Decimal::ZERO) {
            return Err(KnowtonError::config(format!(
                "reputation factor for {creator} must be positive, got {factor}"
            )));
        }
        Ok(())
    }

    /// Timeout of a single ledger call.
    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }
}
