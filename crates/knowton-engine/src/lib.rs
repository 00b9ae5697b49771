//! # KnowTon Engine
//!
//! The bonding service for IP-backed bonds.
//!
//! This crate provides:
//! - [`BondingService`]: Issuance, investment, revenue distribution,
//!   redemption and queries against an external ledger
//! - [`BondingServiceBuilder`]: Dependency wiring
//! - [`BondingConfig`]: TOML configuration
//! - [`RetryConfig`]: Backoff policy for ledger calls
//!
//! ## Architecture
//!
//! ```text
//! Caller ─> BondingService ─┬─> RiskAssessor ─┬─> ValuationOracle
//!                           │                 └─> RiskEngine (fallback)
//!                           ├─> BondLedger (retry + timeout)
//!                           └─> StorageAdapter
//! ```
//!
//! Mutating operations on one bond are serialized by a per-bond async lock.
//!
//! ## Usage
//!
//! ```ignore
//! let service = BondingServiceBuilder::new()
//!     .with_config(BondingConfig::from_file("knowton.toml")?)
//!     .with_ledger(ledger)
//!     .with_storage(storage)
//!     .build()?;
//!
//! let bond = service.issue_bond(terms).await?;
//! service.invest(bond.id(), TrancheKind::Senior, &investor, dec!(100)).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod retry;
pub mod service;

// Re-exports
pub use builder::BondingServiceBuilder;
pub use config::{BondingConfig, OracleSettings, RetrySettings};
pub use retry::RetryConfig;
pub use service::BondingService;
