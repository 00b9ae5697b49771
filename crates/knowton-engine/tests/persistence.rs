//! Service state survives a restart on redb storage.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use tempfile::TempDir;

use knowton_bonds::accrual::SECONDS_PER_YEAR;
use knowton_bonds::{BondTerms, TrancheApys};
use knowton_core::{AssetRef, BondStatus, FixedClock, InvestorId, TrancheKind};
use knowton_engine::{BondingConfig, BondingServiceBuilder};
use knowton_ext_memory::InMemoryLedger;
use knowton_ext_redb::create_redb_storage;

#[tokio::test]
async fn test_bond_and_history_survive_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("knowton.redb");
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let year = Duration::seconds(SECONDS_PER_YEAR);

    let clock = Arc::new(FixedClock::new(start));
    let ledger = Arc::new(InMemoryLedger::with_clock(clock.clone()));
    let alice = InvestorId::from("alice");

    let id = {
        let service = BondingServiceBuilder::new()
            .with_config(BondingConfig::minimal())
            .with_ledger(ledger.clone())
            .with_storage(create_redb_storage(&path).unwrap())
            .with_clock(clock.clone())
            .build()
            .unwrap();

        let bond = service
            .issue_bond(BondTerms {
                asset: AssetRef::new("0xnft", 1),
                issuer: "0xissuer".into(),
                total_value: dec!(300),
                maturity: start + year * 2,
                apys: TrancheApys::new(dec!(0.05), dec!(0.10), dec!(0.15)),
            })
            .await
            .unwrap();
        service
            .invest(bond.id(), TrancheKind::Senior, &alice, dec!(100))
            .await
            .unwrap();
        clock.advance(year);
        service.distribute_revenue(bond.id(), dec!(50)).await.unwrap();
        bond.id()
    };

    // The first database handle is dropped; reopen on the same file
    let service = BondingServiceBuilder::new()
        .with_config(BondingConfig::minimal())
        .with_ledger(ledger.clone())
        .with_storage(create_redb_storage(&path).unwrap())
        .with_clock(clock.clone())
        .build()
        .unwrap();

    let bond = service.get_bond_info(id).await.unwrap();
    assert_eq!(bond.tranche(TrancheKind::Senior).contribution(&alice), dec!(100));
    assert_eq!(bond.total_revenue(), dec!(50));
    assert_eq!(bond.last_distribution_at(), Some(start + year));
    assert_eq!(service.list_distributions(id).await.unwrap().len(), 1);

    clock.advance(year);
    let payout = service.redeem(id, TrancheKind::Senior, &alice).await.unwrap();
    assert_eq!(payout.total, dec!(110));
    assert_eq!(
        service.get_bond_info(id).await.unwrap().status(),
        BondStatus::Matured
    );
}
