//! Identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger-assigned bond identifier.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BondId(pub u64);

impl BondId {
    /// Create a new bond ID.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BondId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BondId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Investor identifier (wallet address or account ID).
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct InvestorId(pub String);

impl InvestorId {
    /// Create a new investor ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvestorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for InvestorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InvestorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Reference to the IP-NFT backing a bond.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    /// NFT contract address.
    pub nft_contract: String,
    /// Token ID within the contract.
    pub token_id: u64,
}

impl AssetRef {
    /// Create a new asset reference.
    pub fn new(nft_contract: impl Into<String>, token_id: u64) -> Self {
        Self {
            nft_contract: nft_contract.into(),
            token_id,
        }
    }

    /// Storage key in `contract:token` form.
    pub fn key(&self) -> String {
        format!("{}:{}", self.nft_contract.to_lowercase(), self.token_id)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.nft_contract, self.token_id)
    }
}
