//! Property tests of service-level invariants.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use knowton_bonds::{BondTerms, TrancheApys};
use knowton_core::{AssetRef, FixedClock, InvestorId, KnowtonError, TrancheKind};
use knowton_engine::{BondingConfig, BondingServiceBuilder};
use knowton_ext_memory::{create_memory_storage, InMemoryLedger};

fn tranche() -> impl Strategy<Value = TrancheKind> {
    prop_oneof![
        Just(TrancheKind::Senior),
        Just(TrancheKind::Mezzanine),
        Just(TrancheKind::Junior),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Whatever investments are attempted, no tranche ever exceeds its
    /// ceiling and every accepted amount is accounted for exactly once.
    #[test]
    fn prop_investments_never_exceed_ceilings(
        total in 100u32..5_000,
        attempts in prop::collection::vec((tranche(), 1u32..2_000, 0usize..4), 1..30),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
            let clock = Arc::new(FixedClock::new(start));
            let service = BondingServiceBuilder::new()
                .with_config(BondingConfig::minimal())
                .with_ledger(Arc::new(InMemoryLedger::with_clock(clock.clone())))
                .with_storage(create_memory_storage())
                .with_clock(clock)
                .build()
                .unwrap();

            let bond = service
                .issue_bond(BondTerms {
                    asset: AssetRef::new("0xnft", 1),
                    issuer: "0xissuer".into(),
                    total_value: Decimal::from(total),
                    maturity: start + Duration::days(365),
                    apys: TrancheApys::new(
                        Decimal::new(5, 2),
                        Decimal::new(10, 2),
                        Decimal::new(15, 2),
                    ),
                })
                .await
                .unwrap();

            let mut accepted = [Decimal::ZERO; 3];
            for (kind, amount, who) in attempts {
                let investor = InvestorId::new(format!("investor-{who}"));
                match service.invest(bond.id(), kind, &investor, Decimal::from(amount)).await {
                    Ok(_) => accepted[kind.index()] += Decimal::from(amount),
                    Err(KnowtonError::AllocationExceeded { .. }) => {}
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }

            let bond = service.get_bond_info(bond.id()).await.unwrap();
            for t in bond.tranches() {
                assert!(t.invested() <= t.allocation());
                assert_eq!(t.invested(), accepted[t.kind().index()]);
                let by_investor: Decimal = t.contributions().map(|(_, v)| *v).sum();
                assert_eq!(by_investor, t.invested());
            }
        });
    }
}
