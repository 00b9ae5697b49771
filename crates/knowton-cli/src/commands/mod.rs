//! CLI command implementations.

pub mod assess;
pub mod config;
pub mod waterfall;

// Re-export submodules for convenience
pub use assess::AssessArgs;
pub use config::ConfigArgs;
pub use waterfall::WaterfallArgs;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use knowton_engine::BondingConfig;

use crate::error::{CliError, CliResult};

/// Parses `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
pub fn parse_datetime(s: &str) -> CliResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CliError::InvalidDate(s.to_string()))
}

/// `<config dir>/knowton/config.toml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("knowton").join("config.toml"))
}

/// Loads the explicit file, else the default file if present, else defaults.
/// Environment overrides apply in every case.
pub fn load_config(explicit: Option<&Path>) -> CliResult<BondingConfig> {
    let config = match explicit {
        Some(path) => BondingConfig::from_file(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading default config");
                BondingConfig::from_file(path)?
            }
            None => BondingConfig::default(),
        },
    };
    Ok(config.with_env_overrides())
}
