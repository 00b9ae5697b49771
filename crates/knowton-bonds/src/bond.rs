//! The bond entity.

use chrono::{DateTime, Utc};
use knowton_core::{
    AssetRef, BondId, BondStatus, InvestorId, KnowtonError, KnowtonResult, RiskRating, TrancheKind,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accrual::expected_return;
use crate::receipts::DistributionReport;
use crate::split::TrancheSplit;
use crate::tranche::Tranche;
use crate::waterfall::{distribute, TrancheClaim};

/// Annual yields for the three tranches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrancheApys {
    /// Senior APY (fraction).
    pub senior: Decimal,
    /// Mezzanine APY (fraction).
    pub mezzanine: Decimal,
    /// Junior APY (fraction).
    pub junior: Decimal,
}

impl TrancheApys {
    /// Creates APYs in priority order.
    pub fn new(senior: Decimal, mezzanine: Decimal, junior: Decimal) -> Self {
        Self {
            senior,
            mezzanine,
            junior,
        }
    }

    /// APY of `kind`.
    pub fn get(&self, kind: TrancheKind) -> Decimal {
        match kind {
            TrancheKind::Senior => self.senior,
            TrancheKind::Mezzanine => self.mezzanine,
            TrancheKind::Junior => self.junior,
        }
    }

    /// APYs in priority order.
    pub fn to_array(&self) -> [Decimal; 3] {
        [self.senior, self.mezzanine, self.junior]
    }
}

impl From<[Decimal; 3]> for TrancheApys {
    fn from(apys: [Decimal; 3]) -> Self {
        Self::new(apys[0], apys[1], apys[2])
    }
}

/// Terms requested at issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondTerms {
    /// Backing IP-NFT.
    pub asset: AssetRef,
    /// Issuer address.
    pub issuer: String,
    /// Total face value.
    pub total_value: Decimal,
    /// Maturity instant.
    pub maturity: DateTime<Utc>,
    /// Tranche yields.
    pub apys: TrancheApys,
}

impl BondTerms {
    /// Validates the terms at `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> KnowtonResult<()> {
        if self.total_value <= Decimal::ZERO {
            return Err(KnowtonError::validation(format!(
                "total value must be positive, got {}",
                self.total_value
            )));
        }
        if self.maturity <= now {
            return Err(KnowtonError::validation(format!(
                "maturity {} must be in the future",
                self.maturity
            )));
        }
        for kind in TrancheKind::all() {
            let apy = self.apys.get(kind);
            if apy < Decimal::ZERO {
                return Err(KnowtonError::validation(format!(
                    "{kind} APY must not be negative, got {apy}"
                )));
            }
        }
        if self.issuer.trim().is_empty() {
            return Err(KnowtonError::validation("issuer is required"));
        }
        if self.asset.nft_contract.trim().is_empty() {
            return Err(KnowtonError::validation("backing NFT contract is required"));
        }
        Ok(())
    }
}

/// Principal and return owed to a redeeming investor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionQuote {
    /// Investor's recorded contribution.
    pub principal: Decimal,
    /// Return from issuance to maturity on that principal.
    pub expected_return: Decimal,
}

impl RedemptionQuote {
    /// `principal + expected_return`. Quotes from [`Bond::plan_redemption`]
    /// always fit the decimal range.
    pub fn total(&self) -> Decimal {
        self.principal + self.expected_return
    }
}

/// An IP-backed bond with three tranches.
///
/// Once `Matured` or `Defaulted` only redemption bookkeeping may change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    id: BondId,
    asset: AssetRef,
    issuer: String,
    total_value: Decimal,
    maturity: DateTime<Utc>,
    status: BondStatus,
    issued_at: DateTime<Utc>,
    tranches: [Tranche; 3],
    total_revenue: Decimal,
    unallocated_revenue: Decimal,
    last_distribution_at: Option<DateTime<Utc>>,
    issuance_tx: String,
    rating: Option<RiskRating>,
    valuation: Option<Decimal>,
}

impl Bond {
    /// Builds a freshly issued bond from validated terms.
    pub fn issue(
        id: BondId,
        terms: &BondTerms,
        split: &TrancheSplit,
        issued_at: DateTime<Utc>,
        issuance_tx: impl Into<String>,
    ) -> KnowtonResult<Self> {
        terms.validate(issued_at)?;
        let allocations = split.allocate(terms.total_value)?;
        let tranches = TrancheKind::all()
            .map(|kind| Tranche::new(kind, allocations[kind.index()], terms.apys.get(kind)));

        Ok(Self {
            id,
            asset: terms.asset.clone(),
            issuer: terms.issuer.clone(),
            total_value: terms.total_value,
            maturity: terms.maturity,
            status: BondStatus::Active,
            issued_at,
            tranches,
            total_revenue: Decimal::ZERO,
            unallocated_revenue: Decimal::ZERO,
            last_distribution_at: None,
            issuance_tx: issuance_tx.into(),
            rating: None,
            valuation: None,
        })
    }

    /// Attaches the rating and valuation the bond was issued against.
    #[must_use]
    pub fn with_risk(mut self, rating: RiskRating, valuation: Decimal) -> Self {
        self.rating = Some(rating);
        self.valuation = Some(valuation);
        self
    }

    /// Bond identifier.
    pub fn id(&self) -> BondId {
        self.id
    }

    /// Backing asset.
    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    /// Issuer address.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Total face value.
    pub fn total_value(&self) -> Decimal {
        self.total_value
    }

    /// Maturity instant.
    pub fn maturity(&self) -> DateTime<Utc> {
        self.maturity
    }

    /// Stored status. See [`Bond::effective_status`] for the time-adjusted one.
    pub fn status(&self) -> BondStatus {
        self.status
    }

    /// Issuance instant.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Issuance transaction hash.
    pub fn issuance_tx(&self) -> &str {
        &self.issuance_tx
    }

    /// Cumulative revenue received.
    pub fn total_revenue(&self) -> Decimal {
        self.total_revenue
    }

    /// Revenue received but not paid to any tranche.
    pub fn unallocated_revenue(&self) -> Decimal {
        self.unallocated_revenue
    }

    /// Instant of the last distribution.
    pub fn last_distribution_at(&self) -> Option<DateTime<Utc>> {
        self.last_distribution_at
    }

    /// Rating at issuance, if assessed.
    pub fn rating(&self) -> Option<RiskRating> {
        self.rating
    }

    /// Valuation at issuance, if assessed.
    pub fn valuation(&self) -> Option<Decimal> {
        self.valuation
    }

    /// Tranche of `kind`.
    pub fn tranche(&self, kind: TrancheKind) -> &Tranche {
        &self.tranches[kind.index()]
    }

    /// All tranches in priority order.
    pub fn tranches(&self) -> &[Tranche; 3] {
        &self.tranches
    }

    /// Status after applying time-triggered maturity at `now`.
    pub fn effective_status(&self, now: DateTime<Utc>) -> BondStatus {
        if self.status == BondStatus::Active && now >= self.maturity {
            BondStatus::Matured
        } else {
            self.status
        }
    }

    /// Applies time-triggered maturity. Returns true if the status changed.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        let effective = self.effective_status(now);
        if effective == self.status {
            return false;
        }
        log::debug!("bond {} reached maturity, status -> {}", self.id, effective);
        self.status = effective;
        true
    }

    /// Issuer-triggered maturity. Only valid from `Active`.
    pub fn mark_matured(&mut self) -> KnowtonResult<()> {
        self.transition(BondStatus::Matured)
    }

    /// Issuer-triggered default. Only valid from `Active`.
    pub fn mark_defaulted(&mut self) -> KnowtonResult<()> {
        self.transition(BondStatus::Defaulted)
    }

    fn transition(&mut self, to: BondStatus) -> KnowtonResult<()> {
        if self.status != BondStatus::Active {
            return Err(KnowtonError::state(format!(
                "bond {} is {}, cannot transition to {}",
                self.id, self.status, to
            )));
        }
        self.status = to;
        Ok(())
    }

    fn ensure_active(&self, now: DateTime<Utc>, action: &str) -> KnowtonResult<()> {
        match self.effective_status(now) {
            BondStatus::Active => Ok(()),
            status => Err(KnowtonError::state(format!(
                "cannot {action} bond {}: status is {status}",
                self.id
            ))),
        }
    }

    /// Validates an investment without changing anything.
    pub fn check_investment(
        &self,
        kind: TrancheKind,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> KnowtonResult<()> {
        self.ensure_active(now, "invest in")?;
        self.tranche(kind).check_investment(amount)
    }

    /// Records an investment. Returns the investor's cumulative contribution.
    pub fn record_investment(
        &mut self,
        kind: TrancheKind,
        investor: &InvestorId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> KnowtonResult<Decimal> {
        self.check_investment(kind, amount, now)?;
        self.tranches[kind.index()].add_investment(investor, amount)
    }

    /// Start of the next accrual window.
    pub fn accrual_start(&self) -> DateTime<Utc> {
        self.last_distribution_at.unwrap_or(self.issued_at)
    }

    /// Computes the waterfall for `amount` arriving at `now` without applying it.
    pub fn plan_distribution(
        &self,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> KnowtonResult<DistributionReport> {
        if amount <= Decimal::ZERO {
            return Err(KnowtonError::validation(format!(
                "revenue amount must be positive, got {amount}"
            )));
        }
        self.ensure_active(now, "distribute revenue to")?;
        self.revenue_after(amount)?;

        let window_start = self.accrual_start();
        let elapsed = (now - window_start).num_seconds();
        let claims: Vec<TrancheClaim> = self
            .tranches
            .iter()
            .map(|t| TrancheClaim::new(t.kind(), t.outstanding_principal(), t.apy()))
            .collect();
        let allocation = distribute(amount, &claims, elapsed)?;

        Ok(DistributionReport {
            bond_id: self.id,
            window_start,
            window_end: now,
            allocation,
            tx_hash: None,
        })
    }

    /// Applies a planned distribution.
    pub fn record_distribution(&mut self, report: &DistributionReport) -> KnowtonResult<()> {
        if report.bond_id != self.id {
            return Err(KnowtonError::validation(format!(
                "distribution for bond {} applied to bond {}",
                report.bond_id, self.id
            )));
        }
        self.ensure_active(report.window_end, "distribute revenue to")?;
        let total_revenue = self.revenue_after(report.allocation.amount)?;
        // Returns paid and unallocated revenue are bounded by total revenue.
        for payment in &report.allocation.payments {
            self.tranches[payment.kind.index()].add_return(payment.paid);
        }
        self.total_revenue = total_revenue;
        self.unallocated_revenue += report.allocation.unallocated;
        self.last_distribution_at = Some(report.window_end);
        Ok(())
    }

    fn revenue_after(&self, amount: Decimal) -> KnowtonResult<Decimal> {
        self.total_revenue
            .checked_add(amount)
            .ok_or_else(|| KnowtonError::overflow(format!("cumulative revenue of bond {}", self.id)))
    }

    /// Computes what `investor` would receive on redemption at `now`.
    pub fn plan_redemption(
        &self,
        kind: TrancheKind,
        investor: &InvestorId,
        now: DateTime<Utc>,
    ) -> KnowtonResult<RedemptionQuote> {
        if self.status != BondStatus::Matured && now < self.maturity {
            return Err(KnowtonError::state(format!(
                "bond {} cannot be redeemed before maturity {} (status {})",
                self.id, self.maturity, self.status
            )));
        }
        let tranche = self.tranche(kind);
        let principal = tranche.contribution(investor);
        let term_seconds = (self.maturity - self.issued_at).num_seconds();
        let expected_return = expected_return(principal, tranche.apy(), term_seconds)?;
        if principal.checked_add(expected_return).is_none() {
            return Err(KnowtonError::overflow(format!(
                "redemption of {principal} from bond {}",
                self.id
            )));
        }
        Ok(RedemptionQuote {
            principal,
            expected_return,
        })
    }

    /// Zeroes the investor's contribution. Returns the principal redeemed.
    ///
    /// A second call for the same investor redeems zero.
    pub fn record_redemption(
        &mut self,
        kind: TrancheKind,
        investor: &InvestorId,
        now: DateTime<Utc>,
    ) -> KnowtonResult<Decimal> {
        self.plan_redemption(kind, investor, now)?;
        Ok(self.tranches[kind.index()].take_contribution(investor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accrual::SECONDS_PER_YEAR;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn terms(total: Decimal) -> BondTerms {
        BondTerms {
            asset: AssetRef::new("0xnft", 1),
            issuer: "0xissuer".into(),
            total_value: total,
            maturity: t0() + Duration::seconds(2 * SECONDS_PER_YEAR),
            apys: TrancheApys::new(dec!(0.05), dec!(0.10), dec!(0.15)),
        }
    }

    fn bond(total: Decimal) -> Bond {
        Bond::issue(BondId(1), &terms(total), &TrancheSplit::STANDARD, t0(), "0xtx").unwrap()
    }

    #[test]
    fn test_issue_allocates_exactly() {
        let b = bond(dec!(200));
        let sum: Decimal = b.tranches().iter().map(Tranche::allocation).sum();
        assert_eq!(sum, b.total_value());
        assert_eq!(b.tranche(TrancheKind::Senior).allocation(), dec!(100));
        assert_eq!(b.tranche(TrancheKind::Junior).apy(), dec!(0.15));
        assert_eq!(b.status(), BondStatus::Active);
    }

    #[test]
    fn test_issue_validation() {
        let mut t = terms(dec!(0));
        assert!(Bond::issue(BondId(1), &t, &TrancheSplit::STANDARD, t0(), "tx").is_err());

        t = terms(dec!(100));
        t.maturity = t0();
        assert!(matches!(
            Bond::issue(BondId(1), &t, &TrancheSplit::STANDARD, t0(), "tx"),
            Err(KnowtonError::Validation { .. })
        ));

        t = terms(dec!(100));
        t.apys.junior = dec!(-0.01);
        assert!(Bond::issue(BondId(1), &t, &TrancheSplit::STANDARD, t0(), "tx").is_err());
    }

    #[test]
    fn test_invest_after_maturity_is_state_error() {
        let mut b = bond(dec!(300));
        let late = b.maturity() + Duration::seconds(1);
        let err = b
            .record_investment(TrancheKind::Senior, &InvestorId::from("a"), dec!(1), late)
            .unwrap_err();
        assert!(matches!(err, KnowtonError::State { .. }));
    }

    #[test]
    fn test_distribution_window_advances() {
        let mut b = bond(dec!(300));
        let alice = InvestorId::from("alice");
        b.record_investment(TrancheKind::Senior, &alice, dec!(100), t0()).unwrap();

        let half = t0() + Duration::seconds(SECONDS_PER_YEAR / 2);
        let first = b.plan_distribution(dec!(100), half).unwrap();
        assert_eq!(first.paid_to(TrancheKind::Senior), dec!(2.5));
        b.record_distribution(&first).unwrap();

        // Second window only covers the time since the first distribution.
        let year = t0() + Duration::seconds(SECONDS_PER_YEAR);
        let second = b.plan_distribution(dec!(100), year).unwrap();
        assert_eq!(second.window_start, half);
        assert_eq!(second.paid_to(TrancheKind::Senior), dec!(2.5));
        b.record_distribution(&second).unwrap();

        assert_eq!(b.total_revenue(), dec!(200));
        assert_eq!(b.unallocated_revenue(), dec!(195));
        assert_eq!(b.tranche(TrancheKind::Senior).returns_paid(), dec!(5));
    }

    #[test]
    fn test_repeated_distribution_double_pays() {
        let mut b = bond(dec!(300));
        b.record_investment(TrancheKind::Senior, &InvestorId::from("a"), dec!(100), t0())
            .unwrap();
        let at = t0() + Duration::seconds(SECONDS_PER_YEAR);
        let r1 = b.plan_distribution(dec!(5), at).unwrap();
        b.record_distribution(&r1).unwrap();
        let r2 = b.plan_distribution(dec!(5), at).unwrap();
        b.record_distribution(&r2).unwrap();
        assert_eq!(b.total_revenue(), dec!(10));
    }

    #[test]
    fn test_terminal_status_blocks_distribution() {
        let mut b = bond(dec!(300));
        b.mark_defaulted().unwrap();
        assert!(matches!(
            b.plan_distribution(dec!(1), t0()),
            Err(KnowtonError::State { .. })
        ));
        assert!(b.mark_matured().is_err());
    }

    #[test]
    fn test_redemption_before_maturity_rejected() {
        let b = bond(dec!(300));
        let err = b
            .plan_redemption(TrancheKind::Senior, &InvestorId::from("a"), t0())
            .unwrap_err();
        assert!(matches!(err, KnowtonError::State { .. }));
    }

    #[test]
    fn test_redemption_after_issuer_matures() {
        let mut b = bond(dec!(300));
        let alice = InvestorId::from("alice");
        b.record_investment(TrancheKind::Mezzanine, &alice, dec!(50), t0()).unwrap();
        b.mark_matured().unwrap();

        let quote = b.plan_redemption(TrancheKind::Mezzanine, &alice, t0()).unwrap();
        assert_eq!(quote.principal, dec!(50));
        // Two-year term at 10%.
        assert_eq!(quote.expected_return, dec!(10));
        assert_eq!(quote.total(), dec!(60));

        assert_eq!(b.record_redemption(TrancheKind::Mezzanine, &alice, t0()).unwrap(), dec!(50));
        assert_eq!(b.record_redemption(TrancheKind::Mezzanine, &alice, t0()).unwrap(), Decimal::ZERO);
        assert_eq!(b.tranche(TrancheKind::Mezzanine).redeemed(), dec!(50));
    }

    #[test]
    fn test_decimal_max_bond_issues_and_rejects_overflowing_accrual() {
        let mut t = terms(Decimal::MAX);
        t.apys.senior = dec!(5);
        let mut b = Bond::issue(BondId(1), &t, &TrancheSplit::STANDARD, t0(), "tx").unwrap();
        let ceiling = b.tranche(TrancheKind::Senior).allocation();
        b.record_investment(TrancheKind::Senior, &InvestorId::from("whale"), ceiling, t0())
            .unwrap();

        let at = t0() + Duration::seconds(SECONDS_PER_YEAR);
        let err = b.plan_distribution(dec!(1), at).unwrap_err();
        assert!(matches!(err, KnowtonError::Validation { .. }));
        assert_eq!(b.total_revenue(), Decimal::ZERO);
    }

    #[test]
    fn test_cumulative_revenue_overflow_rejected() {
        let mut b = bond(dec!(300));
        let at = t0() + Duration::seconds(60);
        let first = b.plan_distribution(Decimal::MAX, at).unwrap();
        b.record_distribution(&first).unwrap();
        assert!(matches!(
            b.plan_distribution(dec!(1), at),
            Err(KnowtonError::Validation { .. })
        ));
        assert_eq!(b.total_revenue(), Decimal::MAX);
    }

    #[test]
    fn test_refresh_status_on_maturity() {
        let mut b = bond(dec!(300));
        assert!(!b.refresh_status(t0()));
        assert!(b.refresh_status(b.maturity()));
        assert_eq!(b.status(), BondStatus::Matured);
    }
}
