//! Assess command implementation.
//!
//! Values and rates an IP asset from its content metadata.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;

use knowton_core::{
    AssessmentSource, AssetRef, Clock, ContentCategory, ContentMetadata, FixedClock,
    RiskAssessment,
};
use knowton_engine::BondingConfig;
use knowton_ext_http::HttpValuationOracle;
use knowton_risk::{FallbackAssessor, OracleAssessor, RiskAssessor, RiskEngine, RuleBasedAssessor};

use crate::cli::OutputFormat;
use crate::commands::parse_datetime;
use crate::output::{format_amount, format_ratio, print_header, print_output, print_warning, KeyValue};

/// Arguments for the assess command.
#[derive(Args, Debug)]
pub struct AssessArgs {
    /// Content category (music, video, ebook, course, software, artwork, research, other)
    #[arg(long, default_value = "other")]
    pub category: String,

    /// Creator wallet address
    #[arg(long)]
    pub creator: String,

    /// Content creation date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub created: String,

    /// View count
    #[arg(long, default_value_t = 0)]
    pub views: u64,

    /// Like count
    #[arg(long, default_value_t = 0)]
    pub likes: u64,

    /// Comma-separated tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Content hash (IPFS CID or similar)
    #[arg(long, default_value = "unpinned")]
    pub content_hash: String,

    /// NFT contract address
    #[arg(long, default_value = "0x0000000000000000000000000000000000000000")]
    pub contract: String,

    /// NFT token ID
    #[arg(long, default_value_t = 0)]
    pub token_id: u64,

    /// Evaluation instant (YYYY-MM-DD or RFC 3339). Defaults to now.
    #[arg(long)]
    pub as_of: Option<String>,

    /// Reputation factor for this creator, overriding the configured one
    #[arg(long)]
    pub reputation: Option<Decimal>,

    /// Ask the valuation oracle first, falling back to the rule engine
    #[arg(long)]
    pub oracle: bool,
}

/// Execute the assess command.
pub async fn execute(args: AssessArgs, config: &BondingConfig, format: OutputFormat) -> Result<()> {
    let now = match args.as_of {
        Some(ref s) => parse_datetime(s)?,
        None => Utc::now(),
    };

    let metadata = ContentMetadata {
        category: ContentCategory::parse(&args.category),
        creator_address: args.creator.clone(),
        created_at: parse_datetime(&args.created)?,
        views: args.views,
        likes: args.likes,
        tags: args.tags,
        content_hash: args.content_hash,
    };
    let asset = AssetRef::new(args.contract, args.token_id);

    let mut engine =
        RiskEngine::new().with_reputations(config.reputation.iter().map(|(k, v)| (k, *v)))?;
    if let Some(factor) = args.reputation {
        engine = engine.with_reputation(&args.creator, factor)?;
    }

    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now));
    let rules: Arc<dyn RiskAssessor> = Arc::new(RuleBasedAssessor::new(engine, clock.clone()));
    let assessor: Arc<dyn RiskAssessor> = if args.oracle || config.oracle.enabled {
        let oracle =
            HttpValuationOracle::new(config.oracle.base_url.clone(), config.oracle.timeout())?;
        Arc::new(FallbackAssessor::new(
            Arc::new(OracleAssessor::new(Arc::new(oracle), clock)),
            rules,
            config.oracle.timeout(),
        ))
    } else {
        rules
    };

    tracing::debug!(assessor = assessor.name(), asset = %asset, "Assessing asset");
    let assessment = assessor.assess(&asset, &metadata).await?;
    if assessment.source == AssessmentSource::RuleBasedFallback {
        print_warning("Valuation oracle unavailable, used rule-based valuation");
    }

    render(&assessment, format)
}

fn source_label(source: AssessmentSource) -> &'static str {
    match source {
        AssessmentSource::RuleBased => "rule-based",
        AssessmentSource::Oracle => "oracle",
        AssessmentSource::RuleBasedFallback => "rule-based (oracle fallback)",
    }
}

fn rows(a: &RiskAssessment) -> Vec<KeyValue> {
    let factors = if a.risk_factors.is_empty() {
        "none".to_string()
    } else {
        a.risk_factors.join("; ")
    };

    vec![
        KeyValue::new("Rating", a.rating.to_string()),
        KeyValue::new("Asset", a.asset.to_string()),
        KeyValue::new("Category", a.metadata.category.to_string()),
        KeyValue::new("Valuation", format_amount(a.valuation)),
        KeyValue::new("Confidence", format_ratio(a.confidence)),
        KeyValue::new("Score", format!("{:.1}", a.score)),
        KeyValue::new(
            "Investment Grade",
            if a.rating.is_investment_grade() { "yes" } else { "no" },
        ),
        KeyValue::new("Default Probability", format_ratio(a.default_probability)),
        KeyValue::new("Recommended LTV", format_ratio(a.recommended_ltv)),
        KeyValue::new("Max Borrowable", format_amount(a.max_borrowable())),
        KeyValue::new("Risk Factors", factors),
        KeyValue::new("Source", source_label(a.source)),
        KeyValue::new("Assessed At", a.assessed_at.to_rfc3339()),
    ]
}

fn render(assessment: &RiskAssessment, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            print_header("Risk Assessment");
            print_output(&rows(assessment), format)?;
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(assessment)?);
        }
        OutputFormat::Csv => {
            print_output(&rows(assessment), format)?;
        }
        OutputFormat::Minimal => {
            println!("{}", assessment.rating);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use knowton_core::RiskRating;

    #[test]
    fn test_rows_start_with_rating() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let metadata = ContentMetadata {
            category: ContentCategory::Music,
            creator_address: "0x1234".into(),
            created_at: now - Duration::days(180),
            views: 5_000,
            likes: 500,
            tags: vec![],
            content_hash: "QmHash".into(),
        };
        let assessment = RiskEngine::new()
            .assess(&AssetRef::new("0xnft", 1), &metadata, now)
            .unwrap();
        assert_eq!(assessment.rating, RiskRating::AAA);

        let rows = rows(&assessment);
        assert_eq!(rows[0].value, "AAA");
        assert_eq!(rows.last().unwrap().key, "Assessed At");
        assert!(rows.iter().any(|r| r.key == "Source" && r.value == "rule-based"));
    }
}
