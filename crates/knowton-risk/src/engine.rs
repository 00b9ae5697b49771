//! Rule-based valuation and rating.
//!
//! Every rule takes the evaluation instant explicitly; the engine never reads
//! the system clock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use knowton_core::{
    AssessmentSource, AssetRef, ContentCategory, ContentMetadata, KnowtonError, KnowtonResult,
    RiskAssessment, RiskRating,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Base valuation before any multiplier.
pub const BASE_VALUATION: Decimal = dec!(1000);

/// Valuations never go below this.
pub const MIN_VALUATION: Decimal = dec!(100);

/// Weight of a view in the engagement score.
pub const VIEW_WEIGHT: Decimal = dec!(0.1);

/// Weight of a like in the engagement score.
pub const LIKE_WEIGHT: Decimal = dec!(1);

/// Floor of the age decay multiplier.
pub const MIN_AGE_DECAY: Decimal = dec!(0.5);

/// Age decay per year.
pub const AGE_DECAY_PER_YEAR: Decimal = dec!(0.2);

const SECONDS_PER_YEAR: i64 = 365 * 86_400;

/// Risk factor labels.
pub mod factors {
    /// Fewer than 100 views.
    pub const LOW_VIEWS: &str = "Low view count";
    /// Younger than 30 days.
    pub const NEW_CONTENT: &str = "New content with limited track record";
    /// Fewer than 10 likes.
    pub const LOW_LIKES: &str = "Limited social validation";
    /// Software content.
    pub const OBSOLESCENCE: &str = "Technology obsolescence risk";
}

/// Pure rule engine.
#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    reputation: HashMap<String, Decimal>,
}

impl RiskEngine {
    /// Creates an engine where every creator has reputation 1.0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reputation factor of one creator.
    ///
    /// Factors must be positive.
    pub fn with_reputation(
        mut self,
        creator: impl AsRef<str>,
        factor: Decimal,
    ) -> KnowtonResult<Self> {
        if factor <= Decimal::ZERO {
            return Err(KnowtonError::config(format!(
                "reputation factor for {} must be positive, got {factor}",
                creator.as_ref()
            )));
        }
        self.reputation
            .insert(creator.as_ref().to_lowercase(), factor);
        Ok(self)
    }

    /// Sets several reputation factors.
    pub fn with_reputations<I, S>(self, overrides: I) -> KnowtonResult<Self>
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        overrides
            .into_iter()
            .try_fold(self, |engine, (creator, factor)| {
                engine.with_reputation(creator, factor)
            })
    }

    /// Reputation factor of `creator` (case-insensitive). Defaults to 1.0.
    pub fn reputation_factor(&self, creator: &str) -> Decimal {
        self.reputation
            .get(&creator.to_lowercase())
            .copied()
            .unwrap_or(Decimal::ONE)
    }

    /// Runs the full assessment.
    pub fn assess(
        &self,
        asset: &AssetRef,
        metadata: &ContentMetadata,
        now: DateTime<Utc>,
    ) -> KnowtonResult<RiskAssessment> {
        metadata.validate(now)?;

        let valuation = self.valuation(metadata, now)?;
        let risk_factors = risk_factors(metadata, now);
        let score = score(metadata, risk_factors.len(), now);
        let rating = RiskRating::from_score(score);
        let default_probability = default_probability(rating, metadata, now);

        Ok(RiskAssessment {
            asset: asset.clone(),
            metadata: metadata.clone(),
            valuation,
            confidence: confidence(metadata, now),
            score,
            rating,
            default_probability,
            recommended_ltv: recommended_ltv(rating, default_probability),
            risk_factors,
            source: AssessmentSource::RuleBased,
            assessed_at: now,
        })
    }

    /// `BASE × category × (1 + engagement/1000) × reputation × age decay`,
    /// floored at [`MIN_VALUATION`] and rounded to cents.
    ///
    /// A reputation factor large enough to push the value out of the decimal
    /// range is a validation error.
    pub fn valuation(&self, metadata: &ContentMetadata, now: DateTime<Utc>) -> KnowtonResult<Decimal> {
        let engagement =
            Decimal::from(metadata.views) * VIEW_WEIGHT + Decimal::from(metadata.likes) * LIKE_WEIGHT;
        let engagement_factor = Decimal::ONE + engagement / dec!(1000);

        let value = [
            metadata.category.multiplier(),
            engagement_factor,
            self.reputation_factor(&metadata.creator_address),
            age_decay(metadata, now),
        ]
        .into_iter()
        .try_fold(BASE_VALUATION, Decimal::checked_mul)
        .ok_or_else(|| {
            KnowtonError::overflow(format!("valuation for creator {}", metadata.creator_address))
        })?;

        Ok(value.max(MIN_VALUATION).round_dp(2))
    }
}

/// `max(0.5, 1 − 0.2 × age_years)`.
pub fn age_decay(metadata: &ContentMetadata, now: DateTime<Utc>) -> Decimal {
    let age_seconds = (now - metadata.created_at).num_seconds().max(0);
    let years = Decimal::from(age_seconds) / Decimal::from(SECONDS_PER_YEAR);
    (Decimal::ONE - AGE_DECAY_PER_YEAR * years).max(MIN_AGE_DECAY)
}

/// Labels of the risk factors present.
pub fn risk_factors(metadata: &ContentMetadata, now: DateTime<Utc>) -> Vec<String> {
    let age_days = metadata.age_days(now);
    let mut found = Vec::new();
    if metadata.views < 100 {
        found.push(factors::LOW_VIEWS.to_string());
    }
    if age_days < 30.0 {
        found.push(factors::NEW_CONTENT.to_string());
    }
    if metadata.likes < 10 {
        found.push(factors::LOW_LIKES.to_string());
    }
    if metadata.category == ContentCategory::Software {
        found.push(factors::OBSOLESCENCE.to_string());
    }
    found
}

/// Composite score in [0, 100].
pub fn score(metadata: &ContentMetadata, factor_count: usize, now: DateTime<Utc>) -> f64 {
    let mut score = 100.0 - 10.0 * factor_count as f64;
    if metadata.views > 10_000 {
        score += 10.0;
    }
    if metadata.likes > 1_000 {
        score += 10.0;
    }
    if metadata.age_days(now) > 365.0 {
        score += 15.0;
    }
    score.clamp(0.0, 100.0)
}

/// Band default probability, scaled by 1.5 for content younger than 30 days.
pub fn default_probability(rating: RiskRating, metadata: &ContentMetadata, now: DateTime<Utc>) -> f64 {
    let mut dp = rating.base_default_probability();
    if metadata.age_days(now) < 30.0 {
        dp *= 1.5;
    }
    dp.min(0.99)
}

/// Band LTV scaled by `1 − 0.5 × default_probability`, in [0.10, 0.80].
pub fn recommended_ltv(rating: RiskRating, default_probability: f64) -> f64 {
    (rating.base_ltv() * (1.0 - 0.5 * default_probability)).clamp(0.10, 0.80)
}

/// Confidence in the valuation, at most 0.95.
pub fn confidence(metadata: &ContentMetadata, now: DateTime<Utc>) -> f64 {
    let age_days = metadata.age_days(now);
    let mut c = 0.5;
    if metadata.views > 1_000 {
        c += 0.1;
    }
    if metadata.likes > 100 {
        c += 0.1;
    }
    if age_days > 180.0 {
        c += 0.2;
    } else if age_days > 90.0 {
        c += 0.1;
    }
    if metadata.tags.len() > 5 {
        c += 0.1;
    }
    f64::min(c, 0.95)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn meta(category: ContentCategory, views: u64, likes: u64, age_days: i64) -> ContentMetadata {
        ContentMetadata {
            category,
            creator_address: "0xCreator".into(),
            created_at: now() - Duration::days(age_days),
            views,
            likes,
            tags: vec!["a".into()],
            content_hash: "QmHash".into(),
        }
    }

    fn asset() -> AssetRef {
        AssetRef::new("0xnft", 7)
    }

    #[test]
    fn test_valuation_formula() {
        let engine = RiskEngine::new();
        // engagement 500 + 500 = 1000 -> factor 2; one year -> decay 0.8.
        let m = meta(ContentCategory::Music, 5_000, 500, 365);
        assert_eq!(engine.valuation(&m, now()).unwrap(), dec!(2400));

        // Fresh content has no decay.
        let m = meta(ContentCategory::Artwork, 0, 0, 0);
        assert_eq!(engine.valuation(&m, now()).unwrap(), dec!(3000));
    }

    #[test]
    fn test_age_decay_floor() {
        let m = meta(ContentCategory::Other, 0, 0, 365 * 5);
        assert_eq!(age_decay(&m, now()), dec!(0.5));
        assert_eq!(RiskEngine::new().valuation(&m, now()).unwrap(), dec!(500));
    }

    #[test]
    fn test_valuation_floor_and_reputation() {
        let engine = RiskEngine::new()
            .with_reputation("0xcreator", dec!(0.05))
            .unwrap();
        let m = meta(ContentCategory::Other, 0, 0, 0);
        assert_eq!(engine.reputation_factor("0xCREATOR"), dec!(0.05));
        assert_eq!(engine.valuation(&m, now()).unwrap(), MIN_VALUATION);

        assert!(RiskEngine::new().with_reputation("x", Decimal::ZERO).is_err());
    }

    #[test]
    fn test_out_of_range_valuation_rejected() {
        let engine = RiskEngine::new()
            .with_reputation("0xcreator", dec!(10000000000000000000000000))
            .unwrap();
        let m = meta(ContentCategory::Artwork, 1_000_000, 1_000_000, 0);
        let err = engine.assess(&asset(), &m, now()).unwrap_err();
        assert!(matches!(err, KnowtonError::Validation { .. }));
    }

    #[test]
    fn test_established_content_rates_aaa() {
        let m = meta(ContentCategory::Music, 5_000, 500, 180);
        let a = RiskEngine::new().assess(&asset(), &m, now()).unwrap();
        assert!(a.risk_factors.is_empty());
        assert_relative_eq!(a.score, 100.0);
        assert_eq!(a.rating, RiskRating::AAA);
        assert_relative_eq!(a.default_probability, 0.01);
        assert_relative_eq!(a.recommended_ltv, 0.70 * 0.995, epsilon = 1e-12);
        // 0.5 + views + likes + age > 90 days
        assert_relative_eq!(a.confidence, 0.8, epsilon = 1e-12);
        assert_eq!(a.source, AssessmentSource::RuleBased);
    }

    #[test]
    fn test_new_software_has_all_factors() {
        let m = meta(ContentCategory::Software, 50, 5, 10);
        let a = RiskEngine::new().assess(&asset(), &m, now()).unwrap();
        assert_eq!(a.risk_factors.len(), 4);
        assert_relative_eq!(a.score, 60.0);
        assert_eq!(a.rating, RiskRating::BBB);
        assert_relative_eq!(a.default_probability, 0.15, epsilon = 1e-12);
        assert_relative_eq!(a.recommended_ltv, 0.5 * (1.0 - 0.075), epsilon = 1e-12);
        assert_relative_eq!(a.confidence, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_score_bonuses_and_clamp() {
        let m = meta(ContentCategory::Video, 20_000, 2_000, 400);
        assert_relative_eq!(score(&m, 0, now()), 100.0);
        assert_relative_eq!(score(&m, 2, now()), 100.0);
        let m = meta(ContentCategory::Video, 0, 0, 0);
        assert_relative_eq!(score(&m, 12, now()), 0.0);
    }

    #[test]
    fn test_ltv_clamped() {
        assert_relative_eq!(recommended_ltv(RiskRating::CCC, 0.99), 0.101, epsilon = 1e-12);
        assert_relative_eq!(recommended_ltv(RiskRating::AAA, 0.0), 0.70);
        for rating in RiskRating::all() {
            for dp in [0.0, 0.5, 0.99] {
                let ltv = recommended_ltv(rating, dp);
                assert!((0.10..=0.80).contains(&ltv));
            }
        }
    }

    #[test]
    fn test_confidence_cap() {
        let mut m = meta(ContentCategory::Music, 5_000, 500, 400);
        m.tags = (0..10).map(|i| format!("t{i}")).collect();
        assert_relative_eq!(confidence(&m, now()), 0.95);
    }

    #[test]
    fn test_invalid_metadata_rejected() {
        let mut m = meta(ContentCategory::Music, 1, 1, 1);
        m.content_hash.clear();
        let err = RiskEngine::new().assess(&asset(), &m, now()).unwrap_err();
        assert!(matches!(err, KnowtonError::Validation { .. }));
    }
}
