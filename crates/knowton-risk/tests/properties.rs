//! Property-based tests for the rule engine.

use chrono::{DateTime, Duration, TimeZone, Utc};
use knowton_core::{AssetRef, ContentCategory, ContentMetadata, RiskAssessment, RiskRating};
use knowton_risk::engine::MIN_VALUATION;
use knowton_risk::RiskEngine;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

fn category() -> impl Strategy<Value = ContentCategory> {
    prop_oneof![
        Just(ContentCategory::Music),
        Just(ContentCategory::Video),
        Just(ContentCategory::Ebook),
        Just(ContentCategory::Course),
        Just(ContentCategory::Software),
        Just(ContentCategory::Artwork),
        Just(ContentCategory::Research),
        Just(ContentCategory::Other),
    ]
}

fn metadata() -> impl Strategy<Value = ContentMetadata> {
    (
        category(),
        any::<u64>(),
        any::<u64>(),
        // Up to twenty years old, never in the future.
        0i64..20 * 365 * 86_400,
        0usize..12,
    )
        .prop_map(|(category, views, likes, age_seconds, tag_count)| ContentMetadata {
            category,
            creator_address: "0xcreator".into(),
            created_at: now() - Duration::seconds(age_seconds),
            views,
            likes,
            tags: (0..tag_count).map(|i| format!("tag{i}")).collect(),
            content_hash: "QmHash".into(),
        })
}

fn reputation() -> impl Strategy<Value = Decimal> {
    // 0.01 .. 10.00
    (1i64..=1_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn assessment_stays_in_bounds(m in metadata(), factor in reputation()) {
        let engine = RiskEngine::new().with_reputation("0xcreator", factor).unwrap();
        let a = engine.assess(&AssetRef::new("0xnft", 1), &m, now()).unwrap();

        prop_assert!(RiskRating::all().contains(&a.rating));
        prop_assert_eq!(a.rating, RiskRating::from_score(a.score));
        prop_assert!((0.0..=100.0).contains(&a.score));
        prop_assert!((0.0..=1.0).contains(&a.confidence));
        prop_assert!(a.confidence <= 0.95);
        prop_assert!(a.default_probability > 0.0 && a.default_probability <= 0.99);
        prop_assert!((0.10..=0.80).contains(&a.recommended_ltv));
        prop_assert!(a.valuation >= MIN_VALUATION);
        prop_assert!(a.risk_factors.len() <= 4);
    }

    #[test]
    fn more_engagement_never_lowers_valuation(m in metadata(), extra in 0u64..1_000_000) {
        let engine = RiskEngine::new();
        let mut busier = m.clone();
        busier.likes = m.likes.saturating_add(extra);
        let base = engine.valuation(&m, now()).unwrap();
        let more = engine.valuation(&busier, now()).unwrap();
        prop_assert!(more >= base);
    }
}

#[test]
fn test_assessment_json_shape() {
    let m = ContentMetadata {
        category: ContentCategory::Music,
        creator_address: "0xcreator".into(),
        created_at: now() - Duration::days(180),
        views: 5_000,
        likes: 500,
        tags: vec!["lofi".into()],
        content_hash: "QmHash".into(),
    };
    let a = RiskEngine::new()
        .assess(&AssetRef::new("0xnft", 9), &m, now())
        .unwrap();

    let json = serde_json::to_value(&a).unwrap();
    assert_eq!(json["rating"], "AAA");
    assert_eq!(json["source"], "RuleBased");
    assert_eq!(json["metadata"]["category"], "music");
    assert!(json["risk_factors"].as_array().unwrap().is_empty());

    let back: RiskAssessment = serde_json::from_value(json).unwrap();
    assert_eq!(back.rating, a.rating);
    assert_eq!(back.valuation, a.valuation);
    assert_eq!(back.asset, a.asset);
    assert_eq!(back.metadata, a.metadata);
}
