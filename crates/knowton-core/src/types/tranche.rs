//! Tranche classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority-ordered slice of a bond's capital structure.
///
/// Ordered from most senior (paid first) to most junior.
///
/// # Examples
///
/// ```
/// use knowton_core::types::TrancheKind;
///
/// assert!(TrancheKind::Senior < TrancheKind::Junior);
/// assert_eq!(TrancheKind::from_index(1), Some(TrancheKind::Mezzanine));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrancheKind {
    /// First claim on revenue.
    Senior = 0,
    /// Paid after Senior.
    Mezzanine = 1,
    /// Paid last, highest yield.
    Junior = 2,
}

impl TrancheKind {
    /// Returns all tranche kinds in waterfall priority order.
    pub const fn all() -> [Self; 3] {
        [Self::Senior, Self::Mezzanine, Self::Junior]
    }

    /// Ledger tranche index (0 = Senior).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Looks up a tranche by ledger index.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Senior),
            1 => Some(Self::Mezzanine),
            2 => Some(Self::Junior),
            _ => None,
        }
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Senior => "Senior",
            Self::Mezzanine => "Mezzanine",
            Self::Junior => "Junior",
        }
    }

    /// Qualitative risk level advertised for the tranche.
    pub const fn risk_level(self) -> &'static str {
        match self {
            Self::Senior => "low",
            Self::Mezzanine => "medium",
            Self::Junior => "high",
        }
    }

    /// Parses a tranche name, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "senior" | "0" => Some(Self::Senior),
            "mezzanine" | "mezz" | "1" => Some(Self::Mezzanine),
            "junior" | "2" => Some(Self::Junior),
            _ => None,
        }
    }
}

impl fmt::Display for TrancheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let all = TrancheKind::all();
        assert!(all.windows(2).all(|w| w[0] < w[1]));
        for (i, kind) in all.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(TrancheKind::from_index(i), Some(*kind));
        }
        assert_eq!(TrancheKind::from_index(3), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!(TrancheKind::parse("Senior"), Some(TrancheKind::Senior));
        assert_eq!(TrancheKind::parse("mezz"), Some(TrancheKind::Mezzanine));
        assert_eq!(TrancheKind::parse(" JUNIOR "), Some(TrancheKind::Junior));
        assert_eq!(TrancheKind::parse("equity"), None);
    }
}
