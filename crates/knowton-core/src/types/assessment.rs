//! Risk assessment record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AssetRef, ContentMetadata, RiskRating};

/// Which implementation produced an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentSource {
    /// Local rule-based engine.
    RuleBased,
    /// External valuation oracle.
    Oracle,
    /// Rule-based engine used because the oracle failed or timed out.
    RuleBasedFallback,
}

/// Immutable output of a risk assessment.
///
/// Never mutated after construction; a newer assessment supersedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Asset that was assessed.
    pub asset: AssetRef,
    /// Input metadata.
    pub metadata: ContentMetadata,
    /// Estimated value in USD.
    pub valuation: Decimal,
    /// Confidence in the valuation, in [0, 1].
    pub confidence: f64,
    /// Composite score in [0, 100] the rating was derived from.
    pub score: f64,
    /// Letter rating.
    pub rating: RiskRating,
    /// Probability of default, in [0, 1).
    pub default_probability: f64,
    /// Recommended loan-to-value ratio.
    pub recommended_ltv: f64,
    /// Human-readable risk factors.
    pub risk_factors: Vec<String>,
    /// Producing implementation.
    pub source: AssessmentSource,
    /// When the assessment was computed.
    pub assessed_at: DateTime<Utc>,
}

impl RiskAssessment {
    /// Maximum borrowable amount against the valuation.
    pub fn max_borrowable(&self) -> Decimal {
        Decimal::try_from(self.recommended_ltv).unwrap_or(Decimal::ZERO) * self.valuation
    }
}
