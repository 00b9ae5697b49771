//! The bonding service.
//!
//! Every mutating operation follows the same order: validate locally, call the
//! ledger, apply the change to the local entity, persist. Validation and state
//! errors therefore never reach the ledger, and a ledger failure leaves local
//! state untouched.

use std::sync::Arc;

use dashmap::DashMap;
use knowton_bonds::{Bond, BondTerms, DistributionReport, InvestmentReceipt, Payout, Tranche};
use knowton_core::{
    AssetRef, BondId, Clock, ContentMetadata, InvestorId, KnowtonError, KnowtonResult,
    RiskAssessment, TrancheKind,
};
use knowton_risk::RiskAssessor;
use knowton_traits::{
    BondLedger, DistributionRecord, IssuanceInstruction, LedgerBondInfo, Page, Pagination,
    StorageAdapter, TraitError,
};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info};

use crate::config::BondingConfig;
use crate::retry::RetryConfig;

fn storage_error(e: TraitError) -> KnowtonError {
    KnowtonError::storage(e.to_string())
}

fn ledger_error(operation: &str, e: TraitError) -> KnowtonError {
    let retryable = e.is_retryable();
    KnowtonError::ledger_call(operation, e.to_string(), retryable)
}

/// Per-bond lock. Dropping the last holder removes the map entry, so ids
/// that were only queried or never existed leave nothing behind.
struct BondGuard<'a> {
    locks: &'a DashMap<BondId, Arc<Mutex<()>>>,
    id: BondId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for BondGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold a clone of the Arc, which keeps the entry alive.
        self.locks
            .remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Orchestrates bond issuance, investment, revenue distribution and
/// redemption against an external ledger.
pub struct BondingService {
    config: BondingConfig,
    ledger: Arc<dyn BondLedger>,
    storage: StorageAdapter,
    assessor: Arc<dyn RiskAssessor>,
    clock: Arc<dyn Clock>,
    retry: RetryConfig,
    locks: DashMap<BondId, Arc<Mutex<()>>>,
}

impl BondingService {
    /// Creates a service. Prefer [`crate::BondingServiceBuilder`].
    pub fn new(
        config: BondingConfig,
        ledger: Arc<dyn BondLedger>,
        storage: StorageAdapter,
        assessor: Arc<dyn RiskAssessor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let retry = config.retry.to_retry_config();
        Self {
            config,
            ledger,
            storage,
            assessor,
            clock,
            retry,
            locks: DashMap::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &BondingConfig {
        &self.config
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    async fn lock(&self, id: BondId) -> BondGuard<'_> {
        let mutex = self.locks.entry(id).or_default().clone();
        BondGuard {
            locks: &self.locks,
            id,
            guard: Some(mutex.lock_owned().await),
        }
    }

    /// Loads a bond and applies time-triggered maturity. Caller holds the lock.
    async fn load(&self, id: BondId) -> KnowtonResult<Bond> {
        let mut bond = self
            .storage
            .bonds
            .get(id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| KnowtonError::not_found("Bond", id))?;

        if bond.refresh_status(self.clock.now()) {
            info!(bond_id = %id, status = %bond.status(), "Bond reached maturity");
            self.save(&bond).await?;
        }
        Ok(bond)
    }

    async fn save(&self, bond: &Bond) -> KnowtonResult<()> {
        self.storage.bonds.save(bond).await.map_err(|e| {
            error!(bond_id = %bond.id(), error = %e, "Failed to persist bond");
            storage_error(e)
        })
    }

    // =========================================================================
    // RISK
    // =========================================================================

    /// Assesses an asset with the configured assessor and stores the result.
    pub async fn assess(
        &self,
        asset: &AssetRef,
        metadata: &ContentMetadata,
    ) -> KnowtonResult<RiskAssessment> {
        let assessment = self.assessor.assess(asset, metadata).await?;
        self.storage
            .assessments
            .save(&assessment)
            .await
            .map_err(storage_error)?;
        debug!(
            asset = %asset,
            rating = %assessment.rating,
            valuation = %assessment.valuation,
            source = ?assessment.source,
            "Stored risk assessment"
        );
        Ok(assessment)
    }

    // =========================================================================
    // ISSUANCE
    // =========================================================================

    /// Issues a bond with the configured tranche split.
    ///
    /// Nothing is recorded locally unless the ledger confirms the issuance.
    pub async fn issue_bond(&self, terms: BondTerms) -> KnowtonResult<Bond> {
        self.issue(terms, None).await
    }

    /// Assesses the backing asset, then issues a bond carrying the resulting
    /// valuation and rating.
    pub async fn issue_assessed_bond(
        &self,
        terms: BondTerms,
        metadata: &ContentMetadata,
    ) -> KnowtonResult<(Bond, RiskAssessment)> {
        terms.validate(self.clock.now())?;
        let assessment = self.assess(&terms.asset, metadata).await?;
        let bond = self.issue(terms, Some(&assessment)).await?;
        Ok((bond, assessment))
    }

    async fn issue(
        &self,
        terms: BondTerms,
        assessment: Option<&RiskAssessment>,
    ) -> KnowtonResult<Bond> {
        let now = self.clock.now();
        terms.validate(now)?;

        let split = self.config.split;
        let instruction = IssuanceInstruction {
            asset: terms.asset.clone(),
            issuer: terms.issuer.clone(),
            total_value: terms.total_value,
            allocations: split.allocate(terms.total_value)?,
            apys: terms.apys.to_array(),
            maturity: terms.maturity,
            valuation: assessment.map(|a| a.valuation),
            rating: assessment.map(|a| a.rating),
        };

        let instruction = &instruction;
        let ledger = &self.ledger;
        let issuance = self
            .retry
            .execute("issue_bond", self.config.ledger_timeout(), move || {
                ledger.issue_bond(instruction)
            })
            .await
            .map_err(|e| ledger_error("issue_bond", e))?;

        let _guard = self.lock(issuance.bond_id).await;
        let mut bond = Bond::issue(
            issuance.bond_id,
            &terms,
            &split,
            now,
            issuance.receipt.tx_hash.clone(),
        )?;
        if let Some(a) = assessment {
            bond = bond.with_risk(a.rating, a.valuation);
        }
        self.save(&bond).await?;

        info!(
            bond_id = %bond.id(),
            asset = %terms.asset,
            total_value = %terms.total_value,
            tx_hash = %issuance.receipt.tx_hash,
            "Bond issued"
        );
        Ok(bond)
    }

    // =========================================================================
    // INVESTMENT
    // =========================================================================

    /// Invests `amount` in one tranche.
    ///
    /// All-or-nothing: an amount exceeding the remaining allocation is
    /// rejected and the tranche is left unchanged.
    pub async fn invest(
        &self,
        bond_id: BondId,
        tranche: TrancheKind,
        investor: &InvestorId,
        amount: Decimal,
    ) -> KnowtonResult<InvestmentReceipt> {
        if investor.as_str().trim().is_empty() {
            return Err(KnowtonError::validation("investor is required"));
        }

        let _guard = self.lock(bond_id).await;
        let mut bond = self.load(bond_id).await?;
        let now = self.clock.now();
        bond.check_investment(tranche, amount, now)?;

        let ledger = &self.ledger;
        let receipt = self
            .retry
            .execute("invest", self.config.ledger_timeout(), move || {
                ledger.invest(bond_id, tranche, investor, amount)
            })
            .await
            .map_err(|e| ledger_error("invest", e))?;

        let investor_total = bond.record_investment(tranche, investor, amount, now)?;
        self.save(&bond).await?;

        let t = bond.tranche(tranche);
        info!(
            bond_id = %bond_id,
            tranche = %tranche,
            investor = %investor,
            amount = %amount,
            tx_hash = %receipt.tx_hash,
            "Investment recorded"
        );
        Ok(InvestmentReceipt {
            bond_id,
            tranche,
            investor: investor.clone(),
            amount,
            investor_total,
            tranche_invested: t.invested(),
            remaining_allocation: t.remaining_allocation(),
            tx_hash: receipt.tx_hash,
            timestamp: now,
        })
    }

    // =========================================================================
    // REVENUE
    // =========================================================================

    /// Distributes one revenue event down the waterfall.
    ///
    /// Not idempotent: every call is a separate revenue event and accrues
    /// returns for the window since the previous distribution. Callers must
    /// invoke it at most once per real revenue event.
    pub async fn distribute_revenue(
        &self,
        bond_id: BondId,
        amount: Decimal,
    ) -> KnowtonResult<DistributionReport> {
        let _guard = self.lock(bond_id).await;
        let mut bond = self.load(bond_id).await?;
        let mut report = bond.plan_distribution(amount, self.clock.now())?;

        let ledger = &self.ledger;
        let receipt = self
            .retry
            .execute("distribute_revenue", self.config.ledger_timeout(), move || {
                ledger.distribute_revenue(bond_id, amount)
            })
            .await
            .map_err(|e| ledger_error("distribute_revenue", e))?;
        report.tx_hash = Some(receipt.tx_hash.clone());

        bond.record_distribution(&report)?;
        self.save(&bond).await?;
        self.storage
            .distributions
            .append(&DistributionRecord::from_report(&report, receipt.tx_hash))
            .await
            .map_err(storage_error)?;

        info!(
            bond_id = %bond_id,
            amount = %amount,
            senior = %report.paid_to(TrancheKind::Senior),
            mezzanine = %report.paid_to(TrancheKind::Mezzanine),
            junior = %report.paid_to(TrancheKind::Junior),
            unallocated = %report.unallocated(),
            "Revenue distributed"
        );
        Ok(report)
    }

    // =========================================================================
    // REDEMPTION
    // =========================================================================

    /// Redeems an investor's position after maturity.
    ///
    /// Redeeming an already-redeemed (or unknown) position returns a zero
    /// payout without an error and without a ledger call.
    pub async fn redeem(
        &self,
        bond_id: BondId,
        tranche: TrancheKind,
        investor: &InvestorId,
    ) -> KnowtonResult<Payout> {
        let _guard = self.lock(bond_id).await;
        let mut bond = self.load(bond_id).await?;
        let now = self.clock.now();
        let quote = bond.plan_redemption(tranche, investor, now)?;

        let mut payout = Payout {
            bond_id,
            tranche,
            investor: investor.clone(),
            principal: quote.principal,
            expected_return: quote.expected_return,
            total: quote.total(),
            tx_hash: None,
            redeemed_at: now,
        };
        if quote.principal.is_zero() {
            debug!(bond_id = %bond_id, tranche = %tranche, investor = %investor, "Nothing to redeem");
            return Ok(payout);
        }

        let total = quote.total();
        let ledger = &self.ledger;
        let receipt = self
            .retry
            .execute("redeem", self.config.ledger_timeout(), move || {
                ledger.redeem(bond_id, tranche, investor, total)
            })
            .await
            .map_err(|e| ledger_error("redeem", e))?;

        bond.record_redemption(tranche, investor, now)?;
        self.save(&bond).await?;

        info!(
            bond_id = %bond_id,
            tranche = %tranche,
            investor = %investor,
            total = %total,
            tx_hash = %receipt.tx_hash,
            "Position redeemed"
        );
        payout.tx_hash = Some(receipt.tx_hash);
        Ok(payout)
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    /// Marks an Active bond as Matured.
    pub async fn mark_matured(&self, bond_id: BondId) -> KnowtonResult<Bond> {
        let _guard = self.lock(bond_id).await;
        let mut bond = self.load(bond_id).await?;
        bond.mark_matured()?;
        self.save(&bond).await?;
        info!(bond_id = %bond_id, "Bond marked matured");
        Ok(bond)
    }

    /// Marks an Active bond as Defaulted.
    pub async fn mark_defaulted(&self, bond_id: BondId) -> KnowtonResult<Bond> {
        let _guard = self.lock(bond_id).await;
        let mut bond = self.load(bond_id).await?;
        bond.mark_defaulted()?;
        self.save(&bond).await?;
        info!(bond_id = %bond_id, "Bond marked defaulted");
        Ok(bond)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Bond with its tranches.
    pub async fn get_bond_info(&self, bond_id: BondId) -> KnowtonResult<Bond> {
        let _guard = self.lock(bond_id).await;
        self.load(bond_id).await
    }

    /// One tranche of a bond.
    pub async fn get_tranche_info(
        &self,
        bond_id: BondId,
        tranche: TrancheKind,
    ) -> KnowtonResult<Tranche> {
        Ok(self.get_bond_info(bond_id).await?.tranche(tranche).clone())
    }

    /// Current contribution of `investor` in a tranche.
    pub async fn get_contribution(
        &self,
        bond_id: BondId,
        tranche: TrancheKind,
        investor: &InvestorId,
    ) -> KnowtonResult<Decimal> {
        Ok(self
            .get_bond_info(bond_id)
            .await?
            .tranche(tranche)
            .contribution(investor))
    }

    /// Bonds ordered by id. Statuses reflect maturity at call time.
    pub async fn list_bonds(&self, pagination: Pagination) -> KnowtonResult<Page<Bond>> {
        let mut page = self
            .storage
            .bonds
            .list(pagination)
            .await
            .map_err(storage_error)?;
        let now = self.clock.now();
        for bond in &mut page.items {
            bond.refresh_status(now);
        }
        Ok(page)
    }

    /// Distribution history of a bond, oldest first.
    pub async fn list_distributions(
        &self,
        bond_id: BondId,
    ) -> KnowtonResult<Vec<DistributionRecord>> {
        if self
            .storage
            .bonds
            .get(bond_id)
            .await
            .map_err(storage_error)?
            .is_none()
        {
            return Err(KnowtonError::not_found("Bond", bond_id));
        }
        self.storage
            .distributions
            .list(bond_id)
            .await
            .map_err(storage_error)
    }

    /// Latest stored assessment of an asset.
    pub async fn get_assessment(&self, asset: &AssetRef) -> KnowtonResult<Option<RiskAssessment>> {
        self.storage
            .assessments
            .get(asset)
            .await
            .map_err(storage_error)
    }

    /// Bond state read directly from the ledger.
    pub async fn ledger_bond_info(&self, bond_id: BondId) -> KnowtonResult<LedgerBondInfo> {
        let ledger = &self.ledger;
        self.retry
            .execute("get_bond_info", self.config.ledger_timeout(), move || {
                ledger.get_bond_info(bond_id)
            })
            .await
            .map_err(|e| ledger_error("get_bond_info", e))
    }
}
