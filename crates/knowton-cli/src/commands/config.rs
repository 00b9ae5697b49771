//! Config command implementation.
//!
//! Shows, validates and initializes the bonding configuration file.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use knowton_core::TrancheKind;
use knowton_engine::BondingConfig;

use crate::cli::OutputFormat;
use crate::commands::{default_config_path, load_config};
use crate::error::CliError;
use crate::output::{print_header, print_info, print_output, print_success, KeyValue};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Show configuration file location
    Path,

    /// Validate a configuration file
    Validate(ValidateArgs),

    /// Write the default configuration to a file
    Init(InitArgs),
}

/// Arguments for validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// File to validate (defaults to the loaded configuration file)
    pub file: Option<PathBuf>,
}

/// Arguments for init subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Destination (defaults to the user config directory)
    pub file: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Execute the config command.
pub fn execute(args: ConfigArgs, explicit: Option<&Path>, format: OutputFormat) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show(&load_config(explicit)?, format),
        ConfigCommand::Path => path(explicit),
        ConfigCommand::Validate(v) => validate(v, explicit),
        ConfigCommand::Init(i) => init(i),
    }
}

fn rows(config: &BondingConfig) -> Vec<KeyValue> {
    let mut rows = Vec::new();
    for kind in TrancheKind::all() {
        rows.push(KeyValue::new(
            format!("split.{}", kind.to_string().to_lowercase()),
            format!("{}%", config.split.percent(kind)),
        ));
    }
    rows.push(KeyValue::new("ledger_timeout_ms", config.ledger_timeout_ms.to_string()));
    rows.push(KeyValue::new("storage_path", config.storage_path.clone()));
    rows.push(KeyValue::new("retry.max_attempts", config.retry.max_attempts.to_string()));
    rows.push(KeyValue::new(
        "retry.initial_delay_ms",
        config.retry.initial_delay_ms.to_string(),
    ));
    rows.push(KeyValue::new("retry.max_delay_ms", config.retry.max_delay_ms.to_string()));
    rows.push(KeyValue::new(
        "retry.backoff_multiplier",
        config.retry.backoff_multiplier.to_string(),
    ));
    rows.push(KeyValue::new("retry.jitter", config.retry.jitter.to_string()));
    rows.push(KeyValue::new("oracle.enabled", config.oracle.enabled.to_string()));
    rows.push(KeyValue::new("oracle.base_url", config.oracle.base_url.clone()));
    rows.push(KeyValue::new("oracle.timeout_ms", config.oracle.timeout_ms.to_string()));
    for (creator, factor) in &config.reputation {
        rows.push(KeyValue::new(format!("reputation.{creator}"), factor.to_string()));
    }
    rows
}

fn show(config: &BondingConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            print_header("Bonding Configuration");
            print_output(&rows(config), format)?;
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Csv => print_output(&rows(config), format)?,
        OutputFormat::Minimal => print!("{}", config.to_toml()?),
    }
    Ok(())
}

fn path(explicit: Option<&Path>) -> Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(default_config_path)
        .ok_or_else(|| CliError::Config("no configuration directory on this platform".into()))?;

    println!("{}", path.display());
    if !path.exists() {
        print_info("File does not exist; built-in defaults are used");
    }
    Ok(())
}

fn validate(args: ValidateArgs, explicit: Option<&Path>) -> Result<()> {
    let file = args
        .file
        .or_else(|| explicit.map(Path::to_path_buf))
        .or_else(default_config_path)
        .ok_or_else(|| CliError::Config("no configuration file given".into()))?;

    BondingConfig::from_file(&file)?;
    print_success(&format!("{} is valid", file.display()));
    Ok(())
}

fn init(args: InitArgs) -> Result<()> {
    let file = args
        .file
        .or_else(default_config_path)
        .ok_or_else(|| CliError::Config("no configuration directory on this platform".into()))?;

    if file.exists() && !args.force {
        return Err(CliError::Config(format!(
            "{} already exists; pass --force to overwrite",
            file.display()
        ))
        .into());
    }
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(CliError::from)?;
    }
    std::fs::write(&file, BondingConfig::default().to_toml()?).map_err(CliError::from)?;

    print_success(&format!("Wrote default configuration to {}", file.display()));
    Ok(())
}
