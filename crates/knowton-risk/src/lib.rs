//! # KnowTon Risk
//!
//! Valuation and credit rating of IP assets backing a bond.
//!
//! - [`RiskEngine`]: Pure rule-based valuation, risk factors and rating
//! - [`RiskAssessor`]: Strategy interface over assessment sources
//! - [`RuleBasedAssessor`] / [`OracleAssessor`]: The two strategies
//! - [`FallbackAssessor`]: Oracle first, rule engine when it fails
//!
//! ## Example
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use knowton_core::{AssetRef, ContentCategory, ContentMetadata, RiskRating};
//! use knowton_risk::RiskEngine;
//!
//! let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
//! let metadata = ContentMetadata {
//!     category: ContentCategory::Music,
//!     creator_address: "0x1234".into(),
//!     created_at: now - Duration::days(180),
//!     views: 5_000,
//!     likes: 500,
//!     tags: vec!["electronic".into()],
//!     content_hash: "QmHash".into(),
//! };
//!
//! let assessment = RiskEngine::new()
//!     .assess(&AssetRef::new("0xnft", 1), &metadata, now)
//!     .unwrap();
//! assert_eq!(assessment.rating, RiskRating::AAA);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assessor;
pub mod engine;
pub mod fallback;

pub use assessor::{OracleAssessor, RiskAssessor, RuleBasedAssessor};
pub use engine::RiskEngine;
pub use fallback::FallbackAssessor;
