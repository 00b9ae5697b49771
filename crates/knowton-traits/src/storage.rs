//! Storage traits for persistence.
//!
//! These traits define interfaces for storage backends:
//! - [`BondStore`]: Bond entities with their tranches
//! - [`DistributionStore`]: Append-only revenue distribution history
//! - [`AssessmentStore`]: Latest risk assessment per asset
//!
//! Storage implementations are EXTENSIONS (in-memory, redb).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use knowton_bonds::{Bond, DistributionReport};
use knowton_core::{AssetRef, BondId, RiskAssessment};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TraitError;

// =============================================================================
// PAGINATION
// =============================================================================

/// Pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of items to skip
    pub offset: usize,
    /// Maximum items to return
    pub limit: usize,
}

impl Pagination {
    /// Create new pagination.
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
        }
    }
}

/// Paginated result.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items in this page
    pub items: Vec<T>,
    /// Total number of items (across all pages)
    pub total: u64,
    /// Current offset
    pub offset: usize,
    /// Page size limit
    pub limit: usize,
}

impl<T> Page<T> {
    /// Slices an already ordered collection.
    pub fn from_sorted(all: Vec<T>, pagination: Pagination) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(pagination.offset)
            .take(pagination.limit)
            .collect();
        Self {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        }
    }

    /// Check if there are more pages.
    pub fn has_more(&self) -> bool {
        (self.offset + self.items.len()) < self.total as usize
    }
}

// =============================================================================
// BOND STORAGE
// =============================================================================

/// Bond storage.
#[async_trait]
pub trait BondStore: Send + Sync {
    /// Get bond by id.
    async fn get(&self, id: BondId) -> Result<Option<Bond>, TraitError>;

    /// Save bond (upsert).
    async fn save(&self, bond: &Bond) -> Result<(), TraitError>;

    /// List bonds ordered by id.
    async fn list(&self, pagination: Pagination) -> Result<Page<Bond>, TraitError>;

    /// Count bonds.
    async fn count(&self) -> Result<u64, TraitError>;
}

// =============================================================================
// DISTRIBUTION STORAGE
// =============================================================================

/// One revenue event as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRecord {
    /// Bond the revenue was paid into.
    pub bond_id: BondId,
    /// Revenue amount.
    pub amount: Decimal,
    /// Waterfall result.
    pub report: DistributionReport,
    /// Ledger transaction hash.
    pub tx_hash: String,
    /// When the distribution was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl DistributionRecord {
    /// Builds a record from a confirmed report.
    pub fn from_report(report: &DistributionReport, tx_hash: impl Into<String>) -> Self {
        Self {
            bond_id: report.bond_id,
            amount: report.amount(),
            report: report.clone(),
            tx_hash: tx_hash.into(),
            recorded_at: report.window_end,
        }
    }
}

/// Append-only distribution history.
#[async_trait]
pub trait DistributionStore: Send + Sync {
    /// Appends a record. Returns its 1-based sequence number within the bond.
    async fn append(&self, record: &DistributionRecord) -> Result<u64, TraitError>;

    /// All records of a bond, oldest first.
    async fn list(&self, bond_id: BondId) -> Result<Vec<DistributionRecord>, TraitError>;
}

// =============================================================================
// ASSESSMENT STORAGE
// =============================================================================

/// Risk assessment storage. Keeps the latest assessment per asset.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Latest assessment of `asset`.
    async fn get(&self, asset: &AssetRef) -> Result<Option<RiskAssessment>, TraitError>;

    /// Stores an assessment, superseding any previous one for the asset.
    async fn save(&self, assessment: &RiskAssessment) -> Result<(), TraitError>;
}

// =============================================================================
// STORAGE ADAPTER
// =============================================================================

/// Combined storage adapter.
#[derive(Clone)]
pub struct StorageAdapter {
    /// Bond store
    pub bonds: Arc<dyn BondStore>,
    /// Distribution store
    pub distributions: Arc<dyn DistributionStore>,
    /// Assessment store
    pub assessments: Arc<dyn AssessmentStore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_slicing() {
        let page = Page::from_sorted((1..=10).collect::<Vec<_>>(), Pagination::new(8, 5));
        assert_eq!(page.items, vec![9, 10]);
        assert_eq!(page.total, 10);
        assert!(!page.has_more());

        let first = Page::from_sorted((1..=10).collect::<Vec<_>>(), Pagination::new(0, 3));
        assert_eq!(first.items, vec![1, 2, 3]);
        assert!(first.has_more());
    }
}
