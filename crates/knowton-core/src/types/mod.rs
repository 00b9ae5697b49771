//! Domain types for the KnowTon bonding workspace.

mod assessment;
mod category;
mod ids;
mod metadata;
mod rating;
mod status;
mod tranche;

pub use assessment::{AssessmentSource, RiskAssessment};
pub use category::ContentCategory;
pub use ids::{AssetRef, BondId, InvestorId};
pub use metadata::ContentMetadata;
pub use rating::RiskRating;
pub use status::BondStatus;
pub use tranche::TrancheKind;
