//! Primary assessor with an explicit fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use knowton_core::{
    AssessmentSource, AssetRef, ContentMetadata, KnowtonError, KnowtonResult, RiskAssessment,
};
use tracing::{debug, warn};

use crate::assessor::RiskAssessor;

/// Runs `primary` under a timeout and falls back to `fallback` when it fails.
///
/// Validation errors are the caller's fault and are returned as-is; the
/// fallback would reject the same input. Fallback results are tagged
/// [`AssessmentSource::RuleBasedFallback`].
pub struct FallbackAssessor {
    primary: Arc<dyn RiskAssessor>,
    fallback: Arc<dyn RiskAssessor>,
    timeout: Duration,
}

impl FallbackAssessor {
    /// Creates the wrapper.
    pub fn new(
        primary: Arc<dyn RiskAssessor>,
        fallback: Arc<dyn RiskAssessor>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }

    async fn run_primary(
        &self,
        asset: &AssetRef,
        metadata: &ContentMetadata,
    ) -> KnowtonResult<RiskAssessment> {
        match tokio::time::timeout(self.timeout, self.primary.assess(asset, metadata)).await {
            Ok(result) => result,
            Err(_) => Err(KnowtonError::oracle(format!(
                "{} assessor timed out after {:?}",
                self.primary.name(),
                self.timeout
            ))),
        }
    }
}

#[async_trait]
impl RiskAssessor for FallbackAssessor {
    async fn assess(
        &self,
        asset: &AssetRef,
        metadata: &ContentMetadata,
    ) -> KnowtonResult<RiskAssessment> {
        match self.run_primary(asset, metadata).await {
            Ok(assessment) => {
                debug!(
                    asset = %asset,
                    assessor = self.primary.name(),
                    rating = %assessment.rating,
                    "Assessment complete"
                );
                Ok(assessment)
            }
            Err(e @ KnowtonError::Validation { .. }) => Err(e),
            Err(e) => {
                warn!(
                    asset = %asset,
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Primary assessor failed, using fallback"
                );
                let mut assessment = self.fallback.assess(asset, metadata).await?;
                assessment.source = AssessmentSource::RuleBasedFallback;
                Ok(assessment)
            }
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
