//! External valuation oracle boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;
use knowton_core::ContentMetadata;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TraitError;

/// Valuation request for one IP-NFT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRequest {
    /// Token id of the NFT.
    pub token_id: u64,
    /// Content metadata.
    pub metadata: ContentMetadata,
    /// Optional free-form history (prior sales, revenue series).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_data: Option<serde_json::Value>,
}

impl ValuationRequest {
    /// Creates a request without history.
    pub fn new(token_id: u64, metadata: ContentMetadata) -> Self {
        Self {
            token_id,
            metadata,
            historical_data: None,
        }
    }
}

/// Oracle valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationEstimate {
    /// Point estimate.
    pub estimated_value: Decimal,
    /// Lower and upper bound of the estimate.
    pub confidence_interval: (f64, f64),
    /// Comparable sales the estimate drew on.
    #[serde(default)]
    pub comparable_sales: Vec<serde_json::Value>,
    /// Contributing factors and their weights.
    #[serde(default)]
    pub factors: BTreeMap<String, f64>,
}

impl ValuationEstimate {
    /// Confidence in [0, 1] derived from the interval width relative to the
    /// estimate. A degenerate interval yields 0.5.
    pub fn confidence(&self) -> f64 {
        let estimate = self.estimated_value.to_f64().unwrap_or(0.0);
        let (lo, hi) = self.confidence_interval;
        if estimate <= 0.0 || hi <= lo {
            return 0.5;
        }
        (1.0 - (hi - lo) / estimate).clamp(0.0, 1.0)
    }
}

/// Valuation oracle.
#[async_trait]
pub trait ValuationOracle: Send + Sync {
    /// Values an asset.
    async fn valuate(&self, request: &ValuationRequest) -> Result<ValuationEstimate, TraitError>;

    /// Checks whether the oracle is reachable.
    async fn health_check(&self) -> Result<(), TraitError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn estimate(value: Decimal, ci: (f64, f64)) -> ValuationEstimate {
        ValuationEstimate {
            estimated_value: value,
            confidence_interval: ci,
            comparable_sales: Vec::new(),
            factors: BTreeMap::new(),
        }
    }

    #[test]
    fn test_confidence_from_interval() {
        let e = estimate(dec!(1000), (900.0, 1100.0));
        assert!((e.confidence() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_interval() {
        assert_eq!(estimate(dec!(1000), (0.0, 0.0)).confidence(), 0.5);
        assert_eq!(estimate(dec!(0), (1.0, 2.0)).confidence(), 0.5);
        assert_eq!(estimate(dec!(10), (0.0, 100.0)).confidence(), 0.0);
    }
}
