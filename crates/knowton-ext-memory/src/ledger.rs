//! In-memory bond ledger.
//!
//! Mirrors the on-chain contract's bookkeeping closely enough to exercise the
//! service: sequential bond ids, allocation ceilings, per-investor positions
//! and a transaction hash per mutating call.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use knowton_core::{BondId, BondStatus, Clock, InvestorId, SystemClock, TrancheKind};
use knowton_traits::{
    BondLedger, IssuanceInstruction, LedgerBondInfo, LedgerEvent, LedgerIssuance, LedgerReceipt,
    LedgerTrancheInfo, TraitError,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;

struct TrancheState {
    allocation: Decimal,
    apy: Decimal,
    invested: Decimal,
    positions: BTreeMap<InvestorId, Decimal>,
}

struct BondState {
    info: LedgerBondInfo,
    tranches: [TrancheState; 3],
}

#[derive(Default)]
struct LedgerState {
    last_bond_id: u64,
    tx_count: u64,
    bonds: BTreeMap<BondId, BondState>,
}

impl LedgerState {
    fn next_tx(&mut self) -> String {
        self.tx_count += 1;
        format!("0x{:064x}", self.tx_count)
    }

    fn bond_mut(&mut self, id: BondId) -> Result<&mut BondState, TraitError> {
        self.bonds
            .get_mut(&id)
            .ok_or_else(|| TraitError::NotFound(format!("bond {id}")))
    }
}

/// Ledger simulator.
///
/// Failures queued with [`InMemoryLedger::fail_next`] are returned, in order,
/// by the next calls of any operation before they touch state.
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    failures: Mutex<VecDeque<TraitError>>,
    calls: Mutex<HashMap<&'static str, u64>>,
    latency: Mutex<Option<Duration>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    /// Creates an empty ledger on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty ledger on `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(HashMap::new()),
            latency: Mutex::new(None),
            clock,
        }
    }

    /// Queues an error for the next call.
    pub fn fail_next(&self, error: TraitError) {
        self.failures.lock().push_back(error);
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Number of calls made to `operation`, including failed ones.
    pub fn call_count(&self, operation: &str) -> u64 {
        self.calls.lock().get(operation).copied().unwrap_or(0)
    }

    /// Number of bonds issued.
    pub fn bond_count(&self) -> usize {
        self.state.lock().bonds.len()
    }

    async fn enter(&self, operation: &'static str) -> Result<(), TraitError> {
        *self.calls.lock().entry(operation).or_insert(0) += 1;
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match self.failures.lock().pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn effective_status(&self, info: &LedgerBondInfo) -> BondStatus {
        if info.status == BondStatus::Active && self.clock.now() >= info.maturity {
            BondStatus::Matured
        } else {
            info.status
        }
    }
}

#[async_trait]
impl BondLedger for InMemoryLedger {
    async fn issue_bond(
        &self,
        instruction: &IssuanceInstruction,
    ) -> Result<LedgerIssuance, TraitError> {
        self.enter("issue_bond").await?;

        let allocated = instruction
            .allocations
            .iter()
            .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(*a));
        if allocated != Some(instruction.total_value) {
            return Err(TraitError::Reverted(format!(
                "allocations {:?} do not sum to total value {}",
                instruction.allocations, instruction.total_value
            )));
        }
        if instruction.maturity <= self.clock.now() {
            return Err(TraitError::Reverted("maturity must be in the future".into()));
        }

        let mut state = self.state.lock();
        state.last_bond_id += 1;
        let bond_id = BondId(state.last_bond_id);
        let tranches = TrancheKind::all().map(|kind| TrancheState {
            allocation: instruction.allocations[kind.index()],
            apy: instruction.apys[kind.index()],
            invested: Decimal::ZERO,
            positions: BTreeMap::new(),
        });
        state.bonds.insert(
            bond_id,
            BondState {
                info: LedgerBondInfo {
                    bond_id,
                    asset: instruction.asset.clone(),
                    issuer: instruction.issuer.clone(),
                    total_value: instruction.total_value,
                    maturity: instruction.maturity,
                    status: BondStatus::Active,
                    total_revenue: Decimal::ZERO,
                },
                tranches,
            },
        );

        let receipt = LedgerReceipt::new(
            state.next_tx(),
            vec![LedgerEvent::BondIssued {
                bond_id,
                asset: instruction.asset.clone(),
                total_value: instruction.total_value,
            }],
        );
        Ok(LedgerIssuance { bond_id, receipt })
    }

    async fn invest(
        &self,
        bond_id: BondId,
        tranche: TrancheKind,
        investor: &InvestorId,
        amount: Decimal,
    ) -> Result<LedgerReceipt, TraitError> {
        self.enter("invest").await?;
        if amount <= Decimal::ZERO {
            return Err(TraitError::Reverted("amount must be positive".into()));
        }

        let mut state = self.state.lock();
        let bond = state.bond_mut(bond_id)?;
        if self.effective_status(&bond.info) != BondStatus::Active {
            return Err(TraitError::Reverted(format!("bond {bond_id} is not active")));
        }
        let t = &mut bond.tranches[tranche.index()];
        if amount > t.allocation - t.invested {
            return Err(TraitError::Reverted(format!(
                "{tranche} allocation exceeded"
            )));
        }
        t.invested += amount;
        *t.positions.entry(investor.clone()).or_insert(Decimal::ZERO) += amount;

        Ok(LedgerReceipt::new(
            state.next_tx(),
            vec![LedgerEvent::Investment {
                bond_id,
                tranche,
                investor: investor.clone(),
                amount,
            }],
        ))
    }

    async fn distribute_revenue(
        &self,
        bond_id: BondId,
        amount: Decimal,
    ) -> Result<LedgerReceipt, TraitError> {
        self.enter("distribute_revenue").await?;
        if amount <= Decimal::ZERO {
            return Err(TraitError::Reverted("amount must be positive".into()));
        }

        let mut state = self.state.lock();
        let bond = state.bond_mut(bond_id)?;
        bond.info.total_revenue = bond
            .info
            .total_revenue
            .checked_add(amount)
            .ok_or_else(|| TraitError::Reverted("revenue total overflow".into()))?;

        Ok(LedgerReceipt::new(
            state.next_tx(),
            vec![LedgerEvent::RevenueDistributed { bond_id, amount }],
        ))
    }

    async fn redeem(
        &self,
        bond_id: BondId,
        tranche: TrancheKind,
        investor: &InvestorId,
        amount: Decimal,
    ) -> Result<LedgerReceipt, TraitError> {
        self.enter("redeem").await?;

        let mut state = self.state.lock();
        let bond = state.bond_mut(bond_id)?;
        let position = bond.tranches[tranche.index()]
            .positions
            .get_mut(investor)
            .filter(|p| !p.is_zero())
            .ok_or_else(|| TraitError::Reverted(format!("{investor} has nothing to redeem")))?;
        *position = Decimal::ZERO;

        Ok(LedgerReceipt::new(
            state.next_tx(),
            vec![LedgerEvent::Redeemed {
                bond_id,
                tranche,
                investor: investor.clone(),
                amount,
            }],
        ))
    }

    async fn get_bond_info(&self, bond_id: BondId) -> Result<LedgerBondInfo, TraitError> {
        self.enter("get_bond_info").await?;
        let mut state = self.state.lock();
        let bond = state.bond_mut(bond_id)?;
        let mut info = bond.info.clone();
        info.status = self.effective_status(&info);
        Ok(info)
    }

    async fn get_tranche_info(
        &self,
        bond_id: BondId,
        tranche: TrancheKind,
    ) -> Result<LedgerTrancheInfo, TraitError> {
        self.enter("get_tranche_info").await?;
        let mut state = self.state.lock();
        let t = &state.bond_mut(bond_id)?.tranches[tranche.index()];
        Ok(LedgerTrancheInfo {
            kind: tranche,
            allocation: t.allocation,
            apy: t.apy,
            total_invested: t.invested,
            investor_count: t.positions.values().filter(|p| !p.is_zero()).count() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use knowton_core::{AssetRef, FixedClock};
    use rust_decimal_macros::dec;

    fn instruction(maturity: chrono::DateTime<Utc>) -> IssuanceInstruction {
        IssuanceInstruction {
            asset: AssetRef::new("0xnft", 1),
            issuer: "0xissuer".into(),
            total_value: dec!(300),
            allocations: [dec!(150), dec!(99), dec!(51)],
            apys: [dec!(0.05), dec!(0.10), dec!(0.15)],
            maturity,
            valuation: None,
            rating: None,
        }
    }

    fn setup() -> (Arc<FixedClock>, InMemoryLedger) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        ));
        let ledger = InMemoryLedger::with_clock(clock.clone());
        (clock, ledger)
    }

    #[tokio::test]
    async fn test_sequential_ids_and_hashes() {
        let (clock, ledger) = setup();
        let maturity = clock.now() + ChronoDuration::days(365);
        let a = ledger.issue_bond(&instruction(maturity)).await.unwrap();
        let b = ledger.issue_bond(&instruction(maturity)).await.unwrap();
        assert_eq!(a.bond_id, BondId(1));
        assert_eq!(b.bond_id, BondId(2));
        assert_eq!(a.receipt.tx_hash.len(), 66);
        assert_ne!(a.receipt.tx_hash, b.receipt.tx_hash);
    }

    #[tokio::test]
    async fn test_ceiling_enforced() {
        let (clock, ledger) = setup();
        let id = ledger
            .issue_bond(&instruction(clock.now() + ChronoDuration::days(365)))
            .await
            .unwrap()
            .bond_id;
        let bob = InvestorId::from("bob");
        ledger.invest(id, TrancheKind::Junior, &bob, dec!(50)).await.unwrap();
        let err = ledger
            .invest(id, TrancheKind::Junior, &bob, dec!(2))
            .await
            .unwrap_err();
        assert!(matches!(err, TraitError::Reverted(_)));

        let info = ledger.get_tranche_info(id, TrancheKind::Junior).await.unwrap();
        assert_eq!(info.total_invested, dec!(50));
        assert_eq!(info.investor_count, 1);
    }

    #[tokio::test]
    async fn test_injected_failure_consumed_once() {
        let (clock, ledger) = setup();
        ledger.fail_next(TraitError::Timeout);
        let maturity = clock.now() + ChronoDuration::days(365);
        assert_eq!(
            ledger.issue_bond(&instruction(maturity)).await.unwrap_err(),
            TraitError::Timeout
        );
        assert_eq!(ledger.bond_count(), 0);
        assert!(ledger.issue_bond(&instruction(maturity)).await.is_ok());
        assert_eq!(ledger.call_count("issue_bond"), 2);
    }

    #[tokio::test]
    async fn test_status_follows_clock() {
        let (clock, ledger) = setup();
        let id = ledger
            .issue_bond(&instruction(clock.now() + ChronoDuration::days(1)))
            .await
            .unwrap()
            .bond_id;
        clock.advance(ChronoDuration::days(2));
        let info = ledger.get_bond_info(id).await.unwrap();
        assert_eq!(info.status, BondStatus::Matured);
        assert!(ledger
            .invest(id, TrancheKind::Senior, &InvestorId::from("a"), dec!(1))
            .await
            .is_err());
    }
}
