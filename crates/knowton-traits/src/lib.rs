//! # KnowTon Traits
//!
//! Boundary traits for the KnowTon bonding service.
//!
//! This crate contains ONLY trait definitions and the plain data that crosses
//! them. All implementations live in extension crates.
//!
//! ## Module Structure
//!
//! - [`ledger`]: The external bond ledger (on-chain contract)
//! - [`oracle`]: The external valuation oracle
//! - [`storage`]: Local persistence of bonds, distributions and assessments
//!
//! ## Dependency Injection
//!
//! The bonding service uses these traits via dependency injection:
//!
//! ```ignore
//! BondingServiceBuilder::new()
//!     .with_ledger(impl BondLedger)
//!     .with_storage(StorageAdapter)
//!     .with_assessor(impl RiskAssessor)
//!     .build()
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod ledger;
pub mod oracle;
pub mod storage;

// Re-export commonly used types
pub use error::TraitError;
pub use ledger::{
    BondLedger, IssuanceInstruction, LedgerBondInfo, LedgerEvent, LedgerIssuance, LedgerReceipt,
    LedgerTrancheInfo,
};
pub use oracle::{ValuationEstimate, ValuationOracle, ValuationRequest};
pub use storage::{
    AssessmentStore, BondStore, DistributionRecord, DistributionStore, Page, Pagination,
    StorageAdapter,
};
