//! # KnowTon Ext Redb
//!
//! Embedded storage implementation using redb for the KnowTon bonding service.
//!
//! This crate provides storage implementations for:
//! - Bonds with their tranches
//! - Revenue distribution history
//! - Risk assessments
//!
//! Records are stored as JSON bytes, one table per record kind.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

use knowton_bonds::Bond;
use knowton_core::{AssetRef, BondId, RiskAssessment};
use knowton_traits::{
    AssessmentStore, BondStore, DistributionRecord, DistributionStore, Page, Pagination,
    StorageAdapter, TraitError,
};

// Table definitions
const BONDS: TableDefinition<u64, &[u8]> = TableDefinition::new("bonds");
const DISTRIBUTIONS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("distributions");
const ASSESSMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("assessments");

fn db_err(e: impl std::fmt::Display) -> TraitError {
    TraitError::DatabaseError(e.to_string())
}

fn parse_err(e: serde_json::Error) -> TraitError {
    TraitError::ParseError(e.to_string())
}

// =============================================================================
// BONDS
// =============================================================================

/// Redb-based bond store.
pub struct RedbBondStore {
    db: Arc<Database>,
}

impl RedbBondStore {
    /// Create a new redb bond store.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BondStore for RedbBondStore {
    async fn get(&self, id: BondId) -> Result<Option<Bond>, TraitError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;

        let table = match read_txn.open_table(BONDS) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(db_err(e)),
        };

        match table.get(id.value()) {
            Ok(Some(data)) => {
                let bond: Bond = serde_json::from_slice(data.value()).map_err(parse_err)?;
                Ok(Some(bond))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn save(&self, bond: &Bond) -> Result<(), TraitError> {
        let bytes = serde_json::to_vec(bond)
            .map_err(|e| TraitError::SerializationError(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(BONDS).map_err(db_err)?;
            table
                .insert(bond.id().value(), bytes.as_slice())
                .map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> Result<Page<Bond>, TraitError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;

        let table = match read_txn.open_table(BONDS) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => {
                return Ok(Page::from_sorted(Vec::new(), pagination));
            }
            Err(e) => return Err(db_err(e)),
        };

        let total = table.len().map_err(db_err)?;
        let mut items = Vec::new();
        for result in table
            .iter()
            .map_err(db_err)?
            .skip(pagination.offset)
            .take(pagination.limit)
        {
            let (_, value) = result.map_err(db_err)?;
            items.push(serde_json::from_slice(value.value()).map_err(parse_err)?);
        }

        Ok(Page {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count(&self) -> Result<u64, TraitError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;

        let table = match read_txn.open_table(BONDS) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(0),
            Err(e) => return Err(db_err(e)),
        };

        table.len().map_err(db_err)
    }
}

// =============================================================================
// DISTRIBUTIONS
// =============================================================================

/// Redb-based distribution history, keyed by `(bond_id, sequence)`.
pub struct RedbDistributionStore {
    db: Arc<Database>,
}

impl RedbDistributionStore {
    /// Create a new redb distribution store.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DistributionStore for RedbDistributionStore {
    async fn append(&self, record: &DistributionRecord) -> Result<u64, TraitError> {
        let bytes = serde_json::to_vec(record)
            .map_err(|e| TraitError::SerializationError(e.to_string()))?;
        let bond = record.bond_id.value();

        let write_txn = self.db.begin_write().map_err(db_err)?;
        let sequence = {
            let mut table = write_txn.open_table(DISTRIBUTIONS).map_err(db_err)?;
            let last = table
                .range((bond, 0u64)..=(bond, u64::MAX))
                .map_err(db_err)?
                .next_back()
                .transpose()
                .map_err(db_err)?
                .map(|(key, _)| key.value().1)
                .unwrap_or(0);
            let sequence = last + 1;
            table
                .insert((bond, sequence), bytes.as_slice())
                .map_err(db_err)?;
            sequence
        };
        write_txn.commit().map_err(db_err)?;
        Ok(sequence)
    }

    async fn list(&self, bond_id: BondId) -> Result<Vec<DistributionRecord>, TraitError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;

        let table = match read_txn.open_table(DISTRIBUTIONS) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(db_err(e)),
        };

        let bond = bond_id.value();
        let mut records = Vec::new();
        for result in table.range((bond, 0u64)..=(bond, u64::MAX)).map_err(db_err)? {
            let (_, value) = result.map_err(db_err)?;
            records.push(serde_json::from_slice(value.value()).map_err(parse_err)?);
        }
        Ok(records)
    }
}

// =============================================================================
// ASSESSMENTS
// =============================================================================

/// Redb-based assessment store, keyed by [`AssetRef::key`].
pub struct RedbAssessmentStore {
    db: Arc<Database>,
}

impl RedbAssessmentStore {
    /// Create a new redb assessment store.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AssessmentStore for RedbAssessmentStore {
    async fn get(&self, asset: &AssetRef) -> Result<Option<RiskAssessment>, TraitError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;

        let table = match read_txn.open_table(ASSESSMENTS) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(db_err(e)),
        };

        let key = asset.key();
        let result = match table.get(key.as_str()).map_err(db_err)? {
            Some(data) => Some(serde_json::from_slice(data.value()).map_err(parse_err)?),
            None => None,
        };
        Ok(result)
    }

    async fn save(&self, assessment: &RiskAssessment) -> Result<(), TraitError> {
        let bytes = serde_json::to_vec(assessment)
            .map_err(|e| TraitError::SerializationError(e.to_string()))?;
        let key = assessment.asset.key();

        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(ASSESSMENTS).map_err(db_err)?;
            table.insert(key.as_str(), bytes.as_slice()).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }
}

/// Create a full storage adapter with redb backend.
pub fn create_redb_storage(path: impl AsRef<Path>) -> Result<StorageAdapter, TraitError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db = Arc::new(Database::create(path).map_err(db_err)?);

    Ok(StorageAdapter {
        bonds: Arc::new(RedbBondStore::new(db.clone())),
        distributions: Arc::new(RedbDistributionStore::new(db.clone())),
        assessments: Arc::new(RedbAssessmentStore::new(db)),
    })
}
