//! Risk assessment strategies.

use std::sync::Arc;

use async_trait::async_trait;
use knowton_core::{
    AssessmentSource, AssetRef, Clock, ContentMetadata, KnowtonError, KnowtonResult,
    RiskAssessment, RiskRating,
};
use knowton_traits::{ValuationOracle, ValuationRequest};
use rust_decimal::Decimal;

use crate::engine::{self, RiskEngine};

/// Produces a [`RiskAssessment`] for an IP asset.
#[async_trait]
pub trait RiskAssessor: Send + Sync {
    /// Assesses `asset` described by `metadata`.
    async fn assess(
        &self,
        asset: &AssetRef,
        metadata: &ContentMetadata,
    ) -> KnowtonResult<RiskAssessment>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

// =============================================================================
// RULE-BASED
// =============================================================================

/// [`RiskEngine`] evaluated at the clock's current instant.
pub struct RuleBasedAssessor {
    engine: RiskEngine,
    clock: Arc<dyn Clock>,
}

impl RuleBasedAssessor {
    /// Creates an assessor.
    pub fn new(engine: RiskEngine, clock: Arc<dyn Clock>) -> Self {
        Self { engine, clock }
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &RiskEngine {
        &self.engine
    }
}

#[async_trait]
impl RiskAssessor for RuleBasedAssessor {
    async fn assess(
        &self,
        asset: &AssetRef,
        metadata: &ContentMetadata,
    ) -> KnowtonResult<RiskAssessment> {
        self.engine.assess(asset, metadata, self.clock.now())
    }

    fn name(&self) -> &'static str {
        "rule-based"
    }
}

// =============================================================================
// ORACLE
// =============================================================================

/// Valuation from an external oracle; rating rules from the rule engine.
///
/// The oracle supplies the valuation and its confidence. Risk factors, score,
/// rating, default probability and LTV are still computed locally so both
/// strategies rate on the same scale.
pub struct OracleAssessor {
    oracle: Arc<dyn ValuationOracle>,
    clock: Arc<dyn Clock>,
}

impl OracleAssessor {
    /// Creates an assessor.
    pub fn new(oracle: Arc<dyn ValuationOracle>, clock: Arc<dyn Clock>) -> Self {
        Self { oracle, clock }
    }
}

#[async_trait]
impl RiskAssessor for OracleAssessor {
    async fn assess(
        &self,
        asset: &AssetRef,
        metadata: &ContentMetadata,
    ) -> KnowtonResult<RiskAssessment> {
        let now = self.clock.now();
        metadata.validate(now)?;

        let request = ValuationRequest::new(asset.token_id, metadata.clone());
        let estimate = self
            .oracle
            .valuate(&request)
            .await
            .map_err(|e| KnowtonError::oracle(e.to_string()))?;
        if estimate.estimated_value <= Decimal::ZERO {
            return Err(KnowtonError::oracle(format!(
                "non-positive valuation {}",
                estimate.estimated_value
            )));
        }

        let risk_factors = engine::risk_factors(metadata, now);
        let score = engine::score(metadata, risk_factors.len(), now);
        let rating = RiskRating::from_score(score);
        let default_probability = engine::default_probability(rating, metadata, now);

        Ok(RiskAssessment {
            asset: asset.clone(),
            metadata: metadata.clone(),
            valuation: estimate.estimated_value.round_dp(2),
            confidence: estimate.confidence().min(0.95),
            score,
            rating,
            default_probability,
            recommended_ltv: engine::recommended_ltv(rating, default_probability),
            risk_factors,
            source: AssessmentSource::Oracle,
            assessed_at: now,
        })
    }

    fn name(&self) -> &'static str {
        "oracle"
    }
}
