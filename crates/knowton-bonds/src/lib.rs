//! # KnowTon Bonds
//!
//! Domain model for IP-backed bonds split into Senior, Mezzanine and Junior
//! tranches.
//!
//! - [`TrancheSplit`]: Fixed 50/33/17 allocation with validated overrides
//! - [`accrual`]: Simple-interest expected returns over elapsed seconds
//! - [`Bond`] / [`Tranche`]: Entities with investment, distribution and
//!   redemption bookkeeping
//! - [`waterfall`]: Priority-ordered revenue distribution
//!
//! Every mutating method on [`Bond`] has a read-only `check_*`/`plan_*`
//! counterpart so callers can validate before talking to the external ledger
//! and only apply local changes once the ledger has confirmed.
//!
//! ## Example
//!
//! ```rust
//! use knowton_bonds::waterfall::{distribute, TrancheClaim};
//! use knowton_bonds::accrual::SECONDS_PER_YEAR;
//! use knowton_core::TrancheKind;
//! use rust_decimal_macros::dec;
//!
//! let claims = [
//!     TrancheClaim::new(TrancheKind::Senior, dec!(100), dec!(0.05)),
//!     TrancheClaim::new(TrancheKind::Mezzanine, dec!(50), dec!(0.10)),
//!     TrancheClaim::new(TrancheKind::Junior, dec!(50), dec!(0.15)),
//! ];
//! let allocation = distribute(dec!(50), &claims, SECONDS_PER_YEAR).unwrap();
//! assert_eq!(allocation.paid_to(TrancheKind::Junior), dec!(7.5));
//! assert_eq!(allocation.unallocated, dec!(32.5));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accrual;
pub mod bond;
pub mod receipts;
pub mod split;
pub mod tranche;
pub mod waterfall;

pub use bond::{Bond, BondTerms, RedemptionQuote, TrancheApys};
pub use receipts::{DistributionReport, InvestmentReceipt, Payout};
pub use split::TrancheSplit;
pub use tranche::Tranche;
pub use waterfall::{TrancheClaim, TranchePayment, WaterfallAllocation};
