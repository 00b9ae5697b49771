//! Risk rating bands.
//!
//! Seven letter bands derived from a composite 0-100 score. Each band carries a
//! fixed base loan-to-value ratio and a fixed base default probability; the
//! table is static and never interpolated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter rating assigned by the risk engine.
///
/// The ordering is from highest quality (AAA) to lowest (CCC).
///
/// # Examples
///
/// ```
/// use knowton_core::types::RiskRating;
///
/// let rating = RiskRating::from_score(72.5);
/// assert_eq!(rating, RiskRating::A);
/// assert_eq!(rating.base_ltv(), 0.60);
/// assert!(rating.is_investment_grade());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskRating {
    /// Score 90-100
    AAA = 1,
    /// Score 80-89
    AA = 2,
    /// Score 70-79
    A = 3,
    /// Score 60-69
    BBB = 4,
    /// Score 50-59
    BB = 5,
    /// Score 40-49
    B = 6,
    /// Score 0-39
    CCC = 7,
}

/// (rating, minimum score, base LTV, base default probability)
const BANDS: [(RiskRating, f64, f64, f64); 7] = [
    (RiskRating::AAA, 90.0, 0.70, 0.01),
    (RiskRating::AA, 80.0, 0.65, 0.02),
    (RiskRating::A, 70.0, 0.60, 0.05),
    (RiskRating::BBB, 60.0, 0.50, 0.10),
    (RiskRating::BB, 50.0, 0.40, 0.20),
    (RiskRating::B, 40.0, 0.30, 0.35),
    (RiskRating::CCC, 0.0, 0.20, 0.50),
];

impl RiskRating {
    /// Returns all ratings, best first.
    pub const fn all() -> [Self; 7] {
        [
            Self::AAA,
            Self::AA,
            Self::A,
            Self::BBB,
            Self::BB,
            Self::B,
            Self::CCC,
        ]
    }

    /// Maps a composite score to its band. Scores are clamped to [0, 100];
    /// NaN maps to CCC.
    pub fn from_score(score: f64) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) };
        BANDS
            .iter()
            .find(|(_, floor, _, _)| score >= *floor)
            .map_or(Self::CCC, |(rating, _, _, _)| *rating)
    }

    fn band(self) -> &'static (RiskRating, f64, f64, f64) {
        &BANDS[self as usize - 1]
    }

    /// Lowest composite score that earns this rating.
    pub fn min_score(self) -> f64 {
        self.band().1
    }

    /// Base recommended loan-to-value ratio for the band.
    pub fn base_ltv(self) -> f64 {
        self.band().2
    }

    /// Base probability of default for the band.
    pub fn base_default_probability(self) -> f64 {
        self.band().3
    }

    /// Returns true for BBB and better.
    pub fn is_investment_grade(self) -> bool {
        self <= Self::BBB
    }

    /// Letter notation.
    pub const fn notation(self) -> &'static str {
        match self {
            Self::AAA => "AAA",
            Self::AA => "AA",
            Self::A => "A",
            Self::BBB => "BBB",
            Self::BB => "BB",
            Self::B => "B",
            Self::CCC => "CCC",
        }
    }

    /// Parses letter notation.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|r| r.notation().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for RiskRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.notation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(RiskRating::from_score(100.0), RiskRating::AAA);
        assert_eq!(RiskRating::from_score(90.0), RiskRating::AAA);
        assert_eq!(RiskRating::from_score(89.99), RiskRating::AA);
        assert_eq!(RiskRating::from_score(80.0), RiskRating::AA);
        assert_eq!(RiskRating::from_score(70.0), RiskRating::A);
        assert_eq!(RiskRating::from_score(60.0), RiskRating::BBB);
        assert_eq!(RiskRating::from_score(50.0), RiskRating::BB);
        assert_eq!(RiskRating::from_score(40.0), RiskRating::B);
        assert_eq!(RiskRating::from_score(39.9), RiskRating::CCC);
        assert_eq!(RiskRating::from_score(0.0), RiskRating::CCC);
    }

    #[test]
    fn test_out_of_range_scores_clamp() {
        assert_eq!(RiskRating::from_score(150.0), RiskRating::AAA);
        assert_eq!(RiskRating::from_score(-5.0), RiskRating::CCC);
        assert_eq!(RiskRating::from_score(f64::NAN), RiskRating::CCC);
    }

    #[test]
    fn test_static_table() {
        assert_eq!(RiskRating::AAA.base_ltv(), 0.70);
        assert_eq!(RiskRating::CCC.base_ltv(), 0.20);
        assert_eq!(RiskRating::BBB.base_default_probability(), 0.10);
        assert_eq!(RiskRating::B.base_default_probability(), 0.35);
        for rating in RiskRating::all() {
            assert_eq!(RiskRating::from_score(rating.min_score()), rating);
        }
    }

    #[test]
    fn test_parse_and_grade() {
        assert_eq!(RiskRating::parse("bbb"), Some(RiskRating::BBB));
        assert_eq!(RiskRating::parse("D"), None);
        assert!(RiskRating::BBB.is_investment_grade());
        assert!(!RiskRating::BB.is_investment_grade());
    }
}
