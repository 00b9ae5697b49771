//! Priority-ordered revenue waterfall.
//!
//! A single revenue amount is paid down the capital structure: Senior first,
//! then Mezzanine, then Junior. Each tranche receives at most its expected
//! return for the elapsed window; whatever is left after Junior is reported as
//! `unallocated` and is never assigned to a tranche here.

use knowton_core::{KnowtonError, KnowtonResult, TrancheKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accrual::expected_return;

/// A tranche's claim on a revenue event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrancheClaim {
    /// Tranche kind (determines priority).
    pub kind: TrancheKind,
    /// Principal the return accrues on.
    pub principal: Decimal,
    /// Annual yield as a fraction.
    pub apy: Decimal,
}

impl TrancheClaim {
    /// Creates a claim.
    pub fn new(kind: TrancheKind, principal: Decimal, apy: Decimal) -> Self {
        Self {
            kind,
            principal,
            apy,
        }
    }
}

/// Amount paid to one tranche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranchePayment {
    /// Tranche kind.
    pub kind: TrancheKind,
    /// Principal the return accrued on.
    pub principal: Decimal,
    /// Return owed for the window.
    pub expected_return: Decimal,
    /// Amount actually paid.
    pub paid: Decimal,
    /// `expected_return - paid`.
    pub shortfall: Decimal,
}

/// Result of running the waterfall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterfallAllocation {
    /// Revenue that entered the waterfall.
    pub amount: Decimal,
    /// Accrual window length in seconds.
    pub elapsed_seconds: i64,
    /// Payments in priority order.
    pub payments: Vec<TranchePayment>,
    /// Revenue left after Junior was paid. Not carried forward or refunded.
    pub unallocated: Decimal,
}

impl WaterfallAllocation {
    /// Amount paid to `kind` (zero if the tranche had no claim).
    pub fn paid_to(&self, kind: TrancheKind) -> Decimal {
        self.payments
            .iter()
            .find(|p| p.kind == kind)
            .map_or(Decimal::ZERO, |p| p.paid)
    }

    /// Sum paid to all tranches.
    pub fn total_paid(&self) -> Decimal {
        self.payments.iter().map(|p| p.paid).sum()
    }
}

/// Runs the waterfall for `amount` over `elapsed_seconds`.
///
/// Claims are processed in tranche priority order regardless of the order they
/// are passed in. Each tranche is paid `min(remaining, expected_return)` and the
/// remainder flows to the next tranche.
pub fn distribute(
    amount: Decimal,
    claims: &[TrancheClaim],
    elapsed_seconds: i64,
) -> KnowtonResult<WaterfallAllocation> {
    if amount < Decimal::ZERO {
        return Err(KnowtonError::validation(format!(
            "revenue amount must not be negative, got {amount}"
        )));
    }

    let mut ordered: Vec<TrancheClaim> = claims.to_vec();
    ordered.sort_by_key(|c| c.kind);
    if ordered.windows(2).any(|w| w[0].kind == w[1].kind) {
        return Err(KnowtonError::validation("duplicate tranche claim"));
    }

    let mut remaining = amount;
    let mut payments = Vec::with_capacity(ordered.len());
    for claim in ordered {
        let expected = expected_return(claim.principal, claim.apy, elapsed_seconds)?;
        let paid = remaining.min(expected);
        remaining -= paid;
        payments.push(TranchePayment {
            kind: claim.kind,
            principal: claim.principal,
            expected_return: expected,
            paid,
            shortfall: expected - paid,
        });
    }

    Ok(WaterfallAllocation {
        amount,
        elapsed_seconds: elapsed_seconds.max(0),
        payments,
        unallocated: remaining,
    })
}
