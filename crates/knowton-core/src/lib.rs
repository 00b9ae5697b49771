//! # KnowTon Core
//!
//! Core types and abstractions shared by every KnowTon bonding crate.
//!
//! This crate provides the foundational building blocks:
//!
//! - **Types**: Identifiers (`BondId`, `InvestorId`, `AssetRef`), tranche kinds,
//!   bond status, content categories, risk ratings and the `RiskAssessment` record
//! - **Errors**: The `KnowtonError` taxonomy used across the workspace
//! - **Clock**: An injectable time source so time-dependent rules stay testable
//!
//! ## Example
//!
//! ```rust
//! use knowton_core::prelude::*;
//!
//! let rating = RiskRating::from_score(83.0);
//! assert_eq!(rating, RiskRating::AA);
//! assert_eq!(TrancheKind::all()[0], TrancheKind::Senior);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]

pub mod clock;
pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::error::{KnowtonError, KnowtonResult};
    pub use crate::types::{
        AssessmentSource, AssetRef, BondId, BondStatus, ContentCategory, ContentMetadata,
        InvestorId, RiskAssessment, RiskRating, TrancheKind,
    };
}

// Re-export commonly used types at crate root
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{KnowtonError, KnowtonResult};
pub use types::{
    AssessmentSource, AssetRef, BondId, BondStatus, ContentCategory, ContentMetadata, InvestorId,
    RiskAssessment, RiskRating, TrancheKind,
};
