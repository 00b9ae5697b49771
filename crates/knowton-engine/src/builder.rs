//! Builder pattern for the bonding service.

use std::sync::Arc;

use knowton_core::{Clock, KnowtonError, KnowtonResult, SystemClock};
use knowton_risk::{FallbackAssessor, OracleAssessor, RiskAssessor, RiskEngine, RuleBasedAssessor};
use knowton_traits::{BondLedger, StorageAdapter, ValuationOracle};

use crate::config::BondingConfig;
use crate::service::BondingService;

/// Builder for constructing a [`BondingService`].
///
/// The assessor defaults to the rule engine. Supplying an oracle wraps it in
/// a [`FallbackAssessor`] bounded by the configured oracle timeout.
pub struct BondingServiceBuilder {
    config: Option<BondingConfig>,
    ledger: Option<Arc<dyn BondLedger>>,
    storage: Option<StorageAdapter>,
    oracle: Option<Arc<dyn ValuationOracle>>,
    assessor: Option<Arc<dyn RiskAssessor>>,
    clock: Option<Arc<dyn Clock>>,
}

impl BondingServiceBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            ledger: None,
            storage: None,
            oracle: None,
            assessor: None,
            clock: None,
        }
    }

    /// Set the service configuration.
    pub fn with_config(mut self, config: BondingConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the external ledger.
    pub fn with_ledger(mut self, ledger: Arc<dyn BondLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Set the storage adapter.
    pub fn with_storage(mut self, storage: StorageAdapter) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the valuation oracle.
    pub fn with_oracle(mut self, oracle: Arc<dyn ValuationOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Replace the assessor entirely. Takes precedence over [`Self::with_oracle`].
    pub fn with_assessor(mut self, assessor: Arc<dyn RiskAssessor>) -> Self {
        self.assessor = Some(assessor);
        self
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the bonding service.
    pub fn build(self) -> KnowtonResult<BondingService> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let ledger = self
            .ledger
            .ok_or_else(|| KnowtonError::config("ledger not configured"))?;

        let storage = self
            .storage
            .ok_or_else(|| KnowtonError::config("storage not configured"))?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        let assessor = match (self.assessor, self.oracle) {
            (Some(assessor), _) => assessor,
            (None, oracle) => {
                let engine = RiskEngine::new()
                    .with_reputations(config.reputation.iter().map(|(k, v)| (k, *v)))?;
                let rules: Arc<dyn RiskAssessor> =
                    Arc::new(RuleBasedAssessor::new(engine, clock.clone()));
                match oracle {
                    Some(oracle) => Arc::new(FallbackAssessor::new(
                        Arc::new(OracleAssessor::new(oracle, clock.clone())),
                        rules,
                        config.oracle.timeout(),
                    )),
                    None => rules,
                }
            }
        };

        Ok(BondingService::new(config, ledger, storage, assessor, clock))
    }
}

impl Default for BondingServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
