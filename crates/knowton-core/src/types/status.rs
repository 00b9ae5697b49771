//! Bond lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a bond.
///
/// `Matured` and `Defaulted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BondStatus {
    /// Accepting investments and revenue.
    #[default]
    Active,
    /// Maturity reached or declared by the issuer.
    Matured,
    /// Issuer declared default.
    Defaulted,
}

impl BondStatus {
    /// Returns true for `Matured` and `Defaulted`.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Matured | Self::Defaulted)
    }

    /// Ledger status code.
    pub const fn code(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Matured => 1,
            Self::Defaulted => 2,
        }
    }

    /// Looks up a status by ledger code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Active),
            1 => Some(Self::Matured),
            2 => Some(Self::Defaulted),
            _ => None,
        }
    }
}

impl fmt::Display for BondStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "ACTIVE",
            Self::Matured => "MATURED",
            Self::Defaulted => "DEFAULTED",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for status in [BondStatus::Active, BondStatus::Matured, BondStatus::Defaulted] {
            assert_eq!(BondStatus::from_code(status.code()), Some(status));
        }
        assert!(!BondStatus::Active.is_terminal());
        assert!(BondStatus::Defaulted.is_terminal());
        assert_eq!(BondStatus::Matured.to_string(), "MATURED");
    }
}
