//! Content categories and their valuation multipliers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of the IP content backing a bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    /// Music tracks and albums
    Music,
    /// Video content
    Video,
    /// Electronic books
    Ebook,
    /// Educational courses
    Course,
    /// Software and code
    Software,
    /// Digital artwork
    Artwork,
    /// Research papers and datasets
    Research,
    /// Anything else
    #[default]
    Other,
}

impl ContentCategory {
    /// Valuation multiplier applied to the base value.
    pub fn multiplier(self) -> Decimal {
        match self {
            Self::Music => dec!(1.5),
            Self::Video => dec!(2.0),
            Self::Ebook => dec!(1.2),
            Self::Course => dec!(1.8),
            Self::Software => dec!(2.5),
            Self::Artwork => dec!(3.0),
            Self::Research => dec!(1.3),
            Self::Other => Decimal::ONE,
        }
    }

    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Video => "video",
            Self::Ebook => "ebook",
            Self::Course => "course",
            Self::Software => "software",
            Self::Artwork => "artwork",
            Self::Research => "research",
            Self::Other => "other",
        }
    }

    /// Parses a category name; unknown names map to `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "music" => Self::Music,
            "video" => Self::Video,
            "ebook" => Self::Ebook,
            "course" => Self::Course,
            "software" => Self::Software,
            "artwork" => Self::Artwork,
            "research" => Self::Research,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
