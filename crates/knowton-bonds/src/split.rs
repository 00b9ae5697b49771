//! Tranche allocation split.
//!
//! Bonds are carved into three tranches by fixed percentages of total value.
//! The default is 50/33/17; deployments may override it through configuration,
//! but individual issuance requests cannot.

use knowton_core::{KnowtonError, KnowtonResult, TrancheKind};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Senior share of total value, in percent.
pub const SENIOR_PERCENT: Decimal = dec!(50);
/// Mezzanine share of total value, in percent.
pub const MEZZANINE_PERCENT: Decimal = dec!(33);
/// Junior share of total value, in percent.
pub const JUNIOR_PERCENT: Decimal = dec!(17);

/// Percentages of total value allocated to each tranche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSplit")]
pub struct TrancheSplit {
    senior: Decimal,
    mezzanine: Decimal,
    junior: Decimal,
}

#[derive(Deserialize)]
struct RawSplit {
    senior: Decimal,
    mezzanine: Decimal,
    junior: Decimal,
}

impl TryFrom<RawSplit> for TrancheSplit {
    type Error = KnowtonError;

    fn try_from(raw: RawSplit) -> Result<Self, Self::Error> {
        Self::new(raw.senior, raw.mezzanine, raw.junior)
    }
}

impl TrancheSplit {
    /// The standard 50/33/17 split.
    pub const STANDARD: Self = Self {
        senior: SENIOR_PERCENT,
        mezzanine: MEZZANINE_PERCENT,
        junior: JUNIOR_PERCENT,
    };

    /// Creates a validated split. Each share must be positive and the shares
    /// must sum to exactly 100.
    pub fn new(senior: Decimal, mezzanine: Decimal, junior: Decimal) -> KnowtonResult<Self> {
        for (kind, pct) in [
            (TrancheKind::Senior, senior),
            (TrancheKind::Mezzanine, mezzanine),
            (TrancheKind::Junior, junior),
        ] {
            if pct <= Decimal::ZERO {
                return Err(KnowtonError::config(format!(
                    "{kind} share must be positive, got {pct}"
                )));
            }
        }
        let total = senior + mezzanine + junior;
        if total != Decimal::ONE_HUNDRED {
            return Err(KnowtonError::config(format!(
                "tranche shares must sum to 100, got {total}"
            )));
        }
        Ok(Self {
            senior,
            mezzanine,
            junior,
        })
    }

    /// Share of `kind`, in percent.
    pub fn percent(&self, kind: TrancheKind) -> Decimal {
        match kind {
            TrancheKind::Senior => self.senior,
            TrancheKind::Mezzanine => self.mezzanine,
            TrancheKind::Junior => self.junior,
        }
    }

    /// Splits `total_value` into allocation ceilings in priority order.
    ///
    /// Junior receives the remainder so the ceilings always sum to
    /// `total_value` exactly.
    pub fn allocate(&self, total_value: Decimal) -> KnowtonResult<[Decimal; 3]> {
        let senior = share_of(total_value, self.senior)?;
        let mezzanine = share_of(total_value, self.mezzanine)?;
        let junior = total_value
            .checked_sub(senior)
            .and_then(|rest| rest.checked_sub(mezzanine))
            .ok_or_else(|| KnowtonError::overflow(format!("allocation of {total_value}")))?;
        Ok([senior, mezzanine, junior])
    }
}

/// `value × pct / 100`, dividing first when the product leaves the decimal
/// range.
fn share_of(value: Decimal, pct: Decimal) -> KnowtonResult<Decimal> {
    value
        .checked_mul(pct)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .or_else(|| value.checked_div(Decimal::ONE_HUNDRED)?.checked_mul(pct))
        .ok_or_else(|| KnowtonError::overflow(format!("{pct}% of {value}")))
}

impl Default for TrancheSplit {
    fn default() -> Self {
        Self::STANDARD
    }
}
