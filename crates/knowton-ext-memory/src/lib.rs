//! # KnowTon In-Memory Extensions
//!
//! In-process implementations of the KnowTon boundary traits:
//!
//! - [`InMemoryLedger`]: A bond ledger simulator with failure injection
//! - [`InMemoryBondStore`], [`InMemoryDistributionStore`],
//!   [`InMemoryAssessmentStore`]: Non-persistent storage
//!
//! Useful for testing and development. Nothing survives a restart.
//!
//! ## Usage
//!
//! ```rust
//! use knowton_ext_memory::create_memory_storage;
//!
//! let storage = create_memory_storage();
//! # let _ = storage;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ledger;
mod storage;

use std::sync::Arc;

use knowton_traits::StorageAdapter;

pub use ledger::InMemoryLedger;
pub use storage::{InMemoryAssessmentStore, InMemoryBondStore, InMemoryDistributionStore};

/// Creates a storage adapter backed by memory.
pub fn create_memory_storage() -> StorageAdapter {
    StorageAdapter {
        bonds: Arc::new(InMemoryBondStore::new()),
        distributions: Arc::new(InMemoryDistributionStore::new()),
        assessments: Arc::new(InMemoryAssessmentStore::new()),
    }
}
