//! Waterfall command implementation.
//!
//! Runs one revenue distribution over Senior, Mezzanine and Junior without
//! touching any bond.

use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::Tabled;

use knowton_bonds::accrual::SECONDS_PER_YEAR;
use knowton_bonds::waterfall::distribute;
use knowton_bonds::{TrancheClaim, WaterfallAllocation};
use knowton_core::TrancheKind;
use knowton_engine::BondingConfig;

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};
use crate::output::{format_amount, print_header, print_info, print_output};

const SECONDS_PER_DAY: i64 = 86_400;

/// Arguments for the waterfall command.
#[derive(Args, Debug)]
pub struct WaterfallArgs {
    /// Revenue amount to distribute
    #[arg(short, long)]
    pub amount: Decimal,

    /// Outstanding principal per tranche: SENIOR,MEZZANINE,JUNIOR
    #[arg(short, long, value_delimiter = ',', conflicts_with = "total")]
    pub principal: Vec<Decimal>,

    /// Fully subscribed bond of this total value, split per configuration
    #[arg(short, long)]
    pub total: Option<Decimal>,

    /// Annual rates per tranche as fractions: SENIOR,MEZZANINE,JUNIOR
    #[arg(long, value_delimiter = ',', default_value = "0.05,0.10,0.15")]
    pub apy: Vec<Decimal>,

    /// Accrual window in days
    #[arg(short, long, default_value_t = 365)]
    pub days: i64,

    /// Accrual window in seconds, overriding --days
    #[arg(long)]
    pub seconds: Option<i64>,
}

/// One tranche line of the result.
#[derive(Debug, Serialize, Tabled)]
pub struct WaterfallRow {
    #[tabled(rename = "Tranche")]
    pub tranche: String,
    #[tabled(rename = "Principal")]
    pub principal: String,
    #[tabled(rename = "APY")]
    pub apy: String,
    #[tabled(rename = "Expected")]
    pub expected: String,
    #[tabled(rename = "Paid")]
    pub paid: String,
    #[tabled(rename = "Shortfall")]
    pub shortfall: String,
}

fn triple(values: &[Decimal], what: &str) -> CliResult<[Decimal; 3]> {
    match values {
        [senior, mezzanine, junior] => {
            let triple = [*senior, *mezzanine, *junior];
            if triple.iter().any(|v| *v < Decimal::ZERO) {
                return Err(CliError::InvalidArgument(format!("{what} must not be negative")));
            }
            Ok(triple)
        }
        _ => Err(CliError::InvalidArgument(format!(
            "expected 3 comma-separated {what} values, got {}",
            values.len()
        ))),
    }
}

/// Resolves the tranche claims from the arguments.
pub fn claims(args: &WaterfallArgs, config: &BondingConfig) -> CliResult<Vec<TrancheClaim>> {
    let principals = match args.total {
        Some(total) if total <= Decimal::ZERO => {
            return Err(CliError::InvalidArgument(format!(
                "total must be positive, got {total}"
            )));
        }
        Some(total) => config.split.allocate(total)?,
        None if args.principal.is_empty() => {
            return Err(CliError::InvalidArgument(
                "provide --principal or --total".to_string(),
            ));
        }
        None => triple(&args.principal, "principal")?,
    };
    let apys = triple(&args.apy, "apy")?;

    Ok(TrancheKind::all()
        .into_iter()
        .map(|kind| TrancheClaim::new(kind, principals[kind.index()], apys[kind.index()]))
        .collect())
}

fn rows(allocation: &WaterfallAllocation, claims: &[TrancheClaim]) -> Vec<WaterfallRow> {
    allocation
        .payments
        .iter()
        .map(|p| {
            let apy = claims
                .iter()
                .find(|c| c.kind == p.kind)
                .map_or(Decimal::ZERO, |c| c.apy);
            WaterfallRow {
                tranche: p.kind.to_string(),
                principal: format_amount(p.principal),
                apy: format!("{}%", (apy * Decimal::ONE_HUNDRED).normalize()),
                expected: format_amount(p.expected_return),
                paid: format_amount(p.paid),
                shortfall: format_amount(p.shortfall),
            }
        })
        .collect()
}

/// Execute the waterfall command.
pub fn execute(args: WaterfallArgs, config: &BondingConfig, format: OutputFormat) -> Result<()> {
    if args.amount < Decimal::ZERO {
        return Err(CliError::InvalidArgument(format!(
            "amount must not be negative, got {}",
            args.amount
        ))
        .into());
    }
    let elapsed = args.seconds.unwrap_or(args.days.saturating_mul(SECONDS_PER_DAY));
    let claims = claims(&args, config)?;
    let allocation = distribute(args.amount, &claims, elapsed)?;

    match format {
        OutputFormat::Table => {
            print_header("Revenue Waterfall");
            print_output(&rows(&allocation, &claims), format)?;
            let years = Decimal::from(elapsed) / Decimal::from(SECONDS_PER_YEAR);
            print_info(&format!(
                "Window: {} years, distributed {} of {}, unallocated {}",
                years.round_dp(4).normalize(),
                format_amount(allocation.total_paid()),
                format_amount(allocation.amount),
                format_amount(allocation.unallocated),
            ));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&allocation)?);
        }
        OutputFormat::Csv => {
            print_output(&rows(&allocation, &claims), format)?;
        }
        OutputFormat::Minimal => {
            println!("{}", allocation.unallocated.normalize());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args(principal: Vec<Decimal>, total: Option<Decimal>) -> WaterfallArgs {
        WaterfallArgs {
            amount: dec!(50),
            principal,
            total,
            apy: vec![dec!(0.05), dec!(0.10), dec!(0.15)],
            days: 365,
            seconds: None,
        }
    }

    #[test]
    fn test_claims_from_principals() {
        let c = claims(&args(vec![dec!(100), dec!(50), dec!(50)], None), &BondingConfig::default())
            .unwrap();
        assert_eq!(c[0].kind, TrancheKind::Senior);
        assert_eq!(c[2].principal, dec!(50));
        assert_eq!(c[2].apy, dec!(0.15));
    }

    #[test]
    fn test_claims_from_total_use_split() {
        let c = claims(&args(vec![], Some(dec!(300))), &BondingConfig::default()).unwrap();
        let principals: Vec<Decimal> = c.iter().map(|c| c.principal).collect();
        assert_eq!(principals, vec![dec!(150), dec!(99), dec!(51)]);
    }

    #[test]
    fn test_claims_rejects_bad_input() {
        let config = BondingConfig::default();
        assert!(claims(&args(vec![], None), &config).is_err());
        assert!(claims(&args(vec![dec!(1), dec!(2)], None), &config).is_err());
        assert!(claims(&args(vec![dec!(1), dec!(-2), dec!(3)], None), &config).is_err());
        assert!(claims(&args(vec![], Some(dec!(0))), &config).is_err());
    }

    #[test]
    fn test_rows_render_scenario() {
        let a = args(vec![dec!(100), dec!(50), dec!(50)], None);
        let c = claims(&a, &BondingConfig::default()).unwrap();
        let allocation = distribute(a.amount, &c, SECONDS_PER_YEAR).unwrap();
        let rows = rows(&allocation, &c);
        assert_eq!(rows[0].paid, "5.00");
        assert_eq!(rows[1].apy, "10%");
        assert_eq!(rows[2].paid, "7.50");
        assert_eq!(allocation.unallocated, dec!(32.5));
    }
}
