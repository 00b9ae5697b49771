//! Results returned by bond operations.

use chrono::{DateTime, Utc};
use knowton_core::{BondId, InvestorId, TrancheKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::waterfall::WaterfallAllocation;

/// Confirmation of a tranche investment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentReceipt {
    /// Bond invested in.
    pub bond_id: BondId,
    /// Tranche invested in.
    pub tranche: TrancheKind,
    /// Investor.
    pub investor: InvestorId,
    /// Amount of this investment.
    pub amount: Decimal,
    /// Investor's cumulative contribution after this investment.
    pub investor_total: Decimal,
    /// Tranche cumulative invested after this investment.
    pub tranche_invested: Decimal,
    /// Allocation still open in the tranche.
    pub remaining_allocation: Decimal,
    /// Ledger transaction hash.
    pub tx_hash: String,
    /// When the investment was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Outcome of one revenue distribution.
///
/// Distributions are not idempotent: every report corresponds to a separate
/// revenue event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionReport {
    /// Bond the revenue was paid into.
    pub bond_id: BondId,
    /// Start of the accrual window (previous distribution or issuance).
    pub window_start: DateTime<Utc>,
    /// End of the accrual window.
    pub window_end: DateTime<Utc>,
    /// Waterfall result.
    pub allocation: WaterfallAllocation,
    /// Ledger transaction hash, once confirmed.
    pub tx_hash: Option<String>,
}

impl DistributionReport {
    /// Revenue that entered the waterfall.
    pub fn amount(&self) -> Decimal {
        self.allocation.amount
    }

    /// Revenue left after Junior was paid.
    pub fn unallocated(&self) -> Decimal {
        self.allocation.unallocated
    }

    /// Amount paid to `kind`.
    pub fn paid_to(&self, kind: TrancheKind) -> Decimal {
        self.allocation.paid_to(kind)
    }
}

/// Redemption payout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    /// Bond redeemed from.
    pub bond_id: BondId,
    /// Tranche redeemed from.
    pub tranche: TrancheKind,
    /// Investor.
    pub investor: InvestorId,
    /// Principal returned.
    pub principal: Decimal,
    /// Return from issuance to maturity.
    pub expected_return: Decimal,
    /// `principal + expected_return`.
    pub total: Decimal,
    /// Ledger transaction hash; `None` when nothing was owed.
    pub tx_hash: Option<String>,
    /// When the redemption was recorded.
    pub redeemed_at: DateTime<Utc>,
}

impl Payout {
    /// Returns true if nothing was paid.
    pub fn is_empty(&self) -> bool {
        self.total.is_zero()
    }
}
