//! Content metadata used as risk-assessment input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ContentCategory;
use crate::error::{KnowtonError, KnowtonResult};

/// Metadata describing the IP content behind an NFT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    /// Content category.
    pub category: ContentCategory,
    /// Creator wallet address.
    pub creator_address: String,
    /// When the content was created.
    pub created_at: DateTime<Utc>,
    /// View counter.
    pub views: u64,
    /// Like counter.
    pub likes: u64,
    /// Free-text tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Content hash (IPFS CID or similar).
    pub content_hash: String,
}

impl ContentMetadata {
    /// Checks required fields against the evaluation instant `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> KnowtonResult<()> {
        if self.creator_address.trim().is_empty() {
            return Err(KnowtonError::validation("creator address is required"));
        }
        if self.content_hash.trim().is_empty() {
            return Err(KnowtonError::validation("content hash is required"));
        }
        if self.created_at > now {
            return Err(KnowtonError::validation(format!(
                "content creation time {} is in the future",
                self.created_at
            )));
        }
        Ok(())
    }

    /// Content age in fractional days at `now`.
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created_at).num_seconds() as f64 / 86_400.0
    }
}
