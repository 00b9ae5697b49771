//! KnowTon CLI - Command-line interface for IP-backed bond analysis.
//!
//! # Usage
//!
//! ```bash
//! # Rate an IP asset with the rule engine
//! knowton assess --category music --creator 0xabc --created 2024-06-01 --views 5000 --likes 500
//!
//! # Same, asking the valuation oracle first
//! knowton assess --category music --creator 0xabc --created 2024-06-01 --oracle
//!
//! # Run the revenue waterfall for one year
//! knowton waterfall --amount 50 --principal 100,50,50 --days 365
//!
//! # Show the effective configuration
//! knowton config show
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod error;
mod output;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays parseable
    let default_filter = if cli.verbose {
        "info,knowton=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let format = cli.format;
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Assess(args) => {
            let config = commands::load_config(config_path)?;
            commands::assess::execute(args, &config, format).await?
        }
        Commands::Waterfall(args) => {
            let config = commands::load_config(config_path)?;
            commands::waterfall::execute(args, &config, format)?
        }
        Commands::Config(args) => commands::config::execute(args, config_path, format)?,
    }

    Ok(())
}
