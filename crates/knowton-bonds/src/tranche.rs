//! Tranche bookkeeping.

use std::collections::BTreeMap;

use knowton_core::{InvestorId, KnowtonError, KnowtonResult, TrancheKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One slice of a bond's capital structure.
///
/// Invariant: `invested <= allocation`. `invested` and `redeemed` are
/// cumulative and never decrease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tranche {
    kind: TrancheKind,
    allocation: Decimal,
    apy: Decimal,
    invested: Decimal,
    redeemed: Decimal,
    returns_paid: Decimal,
    contributions: BTreeMap<InvestorId, Decimal>,
}

impl Tranche {
    /// Creates an empty tranche.
    pub fn new(kind: TrancheKind, allocation: Decimal, apy: Decimal) -> Self {
        Self {
            kind,
            allocation,
            apy,
            invested: Decimal::ZERO,
            redeemed: Decimal::ZERO,
            returns_paid: Decimal::ZERO,
            contributions: BTreeMap::new(),
        }
    }

    /// Tranche kind.
    pub fn kind(&self) -> TrancheKind {
        self.kind
    }

    /// Allocation ceiling.
    pub fn allocation(&self) -> Decimal {
        self.allocation
    }

    /// Annual yield as a fraction.
    pub fn apy(&self) -> Decimal {
        self.apy
    }

    /// Cumulative amount invested.
    pub fn invested(&self) -> Decimal {
        self.invested
    }

    /// Cumulative principal redeemed.
    pub fn redeemed(&self) -> Decimal {
        self.redeemed
    }

    /// Cumulative waterfall payments received.
    pub fn returns_paid(&self) -> Decimal {
        self.returns_paid
    }

    /// Allocation still open for investment.
    pub fn remaining_allocation(&self) -> Decimal {
        self.allocation - self.invested
    }

    /// Principal invested and not yet redeemed.
    pub fn outstanding_principal(&self) -> Decimal {
        self.invested - self.redeemed
    }

    /// Current contribution of `investor` (zero if unknown or redeemed).
    pub fn contribution(&self, investor: &InvestorId) -> Decimal {
        self.contributions
            .get(investor)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Investors with a non-zero contribution.
    pub fn investor_count(&self) -> usize {
        self.contributions.values().filter(|a| !a.is_zero()).count()
    }

    /// All recorded contributions, including zeroed ones.
    pub fn contributions(&self) -> impl Iterator<Item = (&InvestorId, &Decimal)> {
        self.contributions.iter()
    }

    /// Checks that `amount` fits without partially filling.
    pub fn check_investment(&self, amount: Decimal) -> KnowtonResult<()> {
        if amount <= Decimal::ZERO {
            return Err(KnowtonError::validation(format!(
                "investment amount must be positive, got {amount}"
            )));
        }
        let remaining = self.remaining_allocation();
        if amount > remaining {
            return Err(KnowtonError::AllocationExceeded {
                tranche: self.kind,
                requested: amount,
                remaining,
            });
        }
        Ok(())
    }

    /// Adds `amount` to the investor's contribution. Returns the investor's
    /// new total.
    pub(crate) fn add_investment(
        &mut self,
        investor: &InvestorId,
        amount: Decimal,
    ) -> KnowtonResult<Decimal> {
        self.check_investment(amount)?;
        self.invested += amount;
        let entry = self
            .contributions
            .entry(investor.clone())
            .or_insert(Decimal::ZERO);
        *entry += amount;
        Ok(*entry)
    }

    /// Zeroes the investor's contribution and books it as redeemed.
    /// Returns the principal that was zeroed.
    pub(crate) fn take_contribution(&mut self, investor: &InvestorId) -> Decimal {
        let principal = match self.contributions.get_mut(investor) {
            Some(amount) => std::mem::replace(amount, Decimal::ZERO),
            None => Decimal::ZERO,
        };
        self.redeemed += principal;
        principal
    }

    pub(crate) fn add_return(&mut self, paid: Decimal) {
        self.returns_paid += paid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_repeat_investments_accumulate() {
        let mut t = Tranche::new(TrancheKind::Senior, dec!(100), dec!(0.05));
        let alice = InvestorId::from("alice");
        assert_eq!(t.add_investment(&alice, dec!(30)).unwrap(), dec!(30));
        assert_eq!(t.add_investment(&alice, dec!(20)).unwrap(), dec!(50));
        assert_eq!(t.contribution(&alice), dec!(50));
        assert_eq!(t.invested(), dec!(50));
        assert_eq!(t.remaining_allocation(), dec!(50));
        assert_eq!(t.investor_count(), 1);
    }

    #[test]
    fn test_over_allocation_is_all_or_nothing() {
        let mut t = Tranche::new(TrancheKind::Junior, dec!(34), dec!(0.15));
        let bob = InvestorId::from("bob");
        t.add_investment(&bob, dec!(30)).unwrap();

        let err = t.add_investment(&bob, dec!(5)).unwrap_err();
        assert_eq!(
            err,
            KnowtonError::AllocationExceeded {
                tranche: TrancheKind::Junior,
                requested: dec!(5),
                remaining: dec!(4),
            }
        );
        assert_eq!(t.invested(), dec!(30));
        assert_eq!(t.contribution(&bob), dec!(30));

        // Filling exactly to the ceiling is allowed.
        t.add_investment(&bob, dec!(4)).unwrap();
        assert_eq!(t.remaining_allocation(), Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut t = Tranche::new(TrancheKind::Senior, dec!(100), dec!(0.05));
        let alice = InvestorId::from("alice");
        assert!(matches!(
            t.add_investment(&alice, Decimal::ZERO),
            Err(KnowtonError::Validation { .. })
        ));
        assert!(t.add_investment(&alice, dec!(-1)).is_err());
    }

    #[test]
    fn test_take_contribution_zeroes() {
        let mut t = Tranche::new(TrancheKind::Mezzanine, dec!(66), dec!(0.10));
        let carol = InvestorId::from("carol");
        t.add_investment(&carol, dec!(40)).unwrap();

        assert_eq!(t.take_contribution(&carol), dec!(40));
        assert_eq!(t.contribution(&carol), Decimal::ZERO);
        assert_eq!(t.redeemed(), dec!(40));
        assert_eq!(t.outstanding_principal(), Decimal::ZERO);
        assert_eq!(t.investor_count(), 0);

        assert_eq!(t.take_contribution(&carol), Decimal::ZERO);
        assert_eq!(t.redeemed(), dec!(40));
        // Cumulative invested never decreases.
        assert_eq!(t.invested(), dec!(40));
    }
}
