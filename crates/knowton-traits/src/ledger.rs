//! External bond ledger boundary.
//!
//! The ledger is the source of truth for bond identifiers and serializes
//! state changes at its own layer. Implementations might be:
//! - An EVM contract client
//! - An in-memory simulator for tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use knowton_core::{AssetRef, BondId, BondStatus, InvestorId, RiskRating, TrancheKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TraitError;

// =============================================================================
// INSTRUCTIONS
// =============================================================================

/// Everything the ledger needs to issue a bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuanceInstruction {
    /// Backing IP-NFT.
    pub asset: AssetRef,
    /// Issuer address.
    pub issuer: String,
    /// Total face value.
    pub total_value: Decimal,
    /// Tranche allocation ceilings in priority order.
    pub allocations: [Decimal; 3],
    /// Tranche APYs in priority order.
    pub apys: [Decimal; 3],
    /// Maturity instant.
    pub maturity: DateTime<Utc>,
    /// Valuation submitted with the issuance, if assessed.
    pub valuation: Option<Decimal>,
    /// Rating submitted with the issuance, if assessed.
    pub rating: Option<RiskRating>,
}

// =============================================================================
// RECEIPTS
// =============================================================================

/// Event emitted by a confirmed ledger transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A bond was issued.
    BondIssued {
        /// New bond id.
        bond_id: BondId,
        /// Backing asset.
        asset: AssetRef,
        /// Total face value.
        total_value: Decimal,
    },
    /// An investment was accepted.
    Investment {
        /// Bond invested in.
        bond_id: BondId,
        /// Tranche invested in.
        tranche: TrancheKind,
        /// Investor.
        investor: InvestorId,
        /// Amount.
        amount: Decimal,
    },
    /// Revenue was paid into a bond.
    RevenueDistributed {
        /// Bond receiving revenue.
        bond_id: BondId,
        /// Amount.
        amount: Decimal,
    },
    /// An investor redeemed.
    Redeemed {
        /// Bond redeemed from.
        bond_id: BondId,
        /// Tranche redeemed from.
        tranche: TrancheKind,
        /// Investor.
        investor: InvestorId,
        /// Amount paid out.
        amount: Decimal,
    },
}

/// Confirmation of a ledger transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    /// Transaction hash.
    pub tx_hash: String,
    /// Events emitted by the transaction.
    pub events: Vec<LedgerEvent>,
}

impl LedgerReceipt {
    /// Creates a receipt.
    pub fn new(tx_hash: impl Into<String>, events: Vec<LedgerEvent>) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            events,
        }
    }
}

/// Result of a bond issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerIssuance {
    /// Ledger-assigned bond id.
    pub bond_id: BondId,
    /// Transaction receipt.
    pub receipt: LedgerReceipt,
}

/// Bond state as read back from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerBondInfo {
    /// Bond id.
    pub bond_id: BondId,
    /// Backing asset.
    pub asset: AssetRef,
    /// Issuer address.
    pub issuer: String,
    /// Total face value.
    pub total_value: Decimal,
    /// Maturity instant.
    pub maturity: DateTime<Utc>,
    /// Ledger status.
    pub status: BondStatus,
    /// Cumulative revenue received.
    pub total_revenue: Decimal,
}

/// Tranche state as read back from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTrancheInfo {
    /// Tranche kind.
    pub kind: TrancheKind,
    /// Allocation ceiling.
    pub allocation: Decimal,
    /// APY.
    pub apy: Decimal,
    /// Cumulative invested.
    pub total_invested: Decimal,
    /// Number of investors.
    pub investor_count: u64,
}

// =============================================================================
// LEDGER
// =============================================================================

/// External bond ledger.
///
/// Each mutating call submits one transaction and resolves once it is
/// confirmed. Errors report whether a retry may succeed via
/// [`TraitError::is_retryable`].
#[async_trait]
pub trait BondLedger: Send + Sync {
    /// Issues a bond and returns the ledger-assigned id.
    async fn issue_bond(
        &self,
        instruction: &IssuanceInstruction,
    ) -> Result<LedgerIssuance, TraitError>;

    /// Records an investment in a tranche.
    async fn invest(
        &self,
        bond_id: BondId,
        tranche: TrancheKind,
        investor: &InvestorId,
        amount: Decimal,
    ) -> Result<LedgerReceipt, TraitError>;

    /// Pays revenue into a bond.
    async fn distribute_revenue(
        &self,
        bond_id: BondId,
        amount: Decimal,
    ) -> Result<LedgerReceipt, TraitError>;

    /// Pays out an investor's redemption.
    async fn redeem(
        &self,
        bond_id: BondId,
        tranche: TrancheKind,
        investor: &InvestorId,
        amount: Decimal,
    ) -> Result<LedgerReceipt, TraitError>;

    /// Reads bond state.
    async fn get_bond_info(&self, bond_id: BondId) -> Result<LedgerBondInfo, TraitError>;

    /// Reads tranche state.
    async fn get_tranche_info(
        &self,
        bond_id: BondId,
        tranche: TrancheKind,
    ) -> Result<LedgerTrancheInfo, TraitError>;
}
