//! In-memory stores.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use knowton_bonds::Bond;
use knowton_core::{AssetRef, BondId, RiskAssessment};
use knowton_traits::{
    AssessmentStore, BondStore, DistributionRecord, DistributionStore, Page, Pagination,
    TraitError,
};
use parking_lot::RwLock;

/// Bonds keyed by id.
#[derive(Default)]
pub struct InMemoryBondStore {
    bonds: RwLock<BTreeMap<BondId, Bond>>,
}

impl InMemoryBondStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BondStore for InMemoryBondStore {
    async fn get(&self, id: BondId) -> Result<Option<Bond>, TraitError> {
        Ok(self.bonds.read().get(&id).cloned())
    }

    async fn save(&self, bond: &Bond) -> Result<(), TraitError> {
        self.bonds.write().insert(bond.id(), bond.clone());
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> Result<Page<Bond>, TraitError> {
        let all: Vec<Bond> = self.bonds.read().values().cloned().collect();
        Ok(Page::from_sorted(all, pagination))
    }

    async fn count(&self) -> Result<u64, TraitError> {
        Ok(self.bonds.read().len() as u64)
    }
}

/// Distribution history per bond.
#[derive(Default)]
pub struct InMemoryDistributionStore {
    records: RwLock<HashMap<BondId, Vec<DistributionRecord>>>,
}

impl InMemoryDistributionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DistributionStore for InMemoryDistributionStore {
    async fn append(&self, record: &DistributionRecord) -> Result<u64, TraitError> {
        let mut records = self.records.write();
        let history = records.entry(record.bond_id).or_default();
        history.push(record.clone());
        Ok(history.len() as u64)
    }

    async fn list(&self, bond_id: BondId) -> Result<Vec<DistributionRecord>, TraitError> {
        Ok(self
            .records
            .read()
            .get(&bond_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Latest assessment per asset, keyed by [`AssetRef::key`].
#[derive(Default)]
pub struct InMemoryAssessmentStore {
    assessments: RwLock<HashMap<String, RiskAssessment>>,
}

impl InMemoryAssessmentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssessmentStore for InMemoryAssessmentStore {
    async fn get(&self, asset: &AssetRef) -> Result<Option<RiskAssessment>, TraitError> {
        Ok(self.assessments.read().get(&asset.key()).cloned())
    }

    async fn save(&self, assessment: &RiskAssessment) -> Result<(), TraitError> {
        self.assessments
            .write()
            .insert(assessment.asset.key(), assessment.clone());
        Ok(())
    }
}
