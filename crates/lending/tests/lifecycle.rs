//! Lifecycle tests for the lending core
//!
//! These exercise the ledger, registry and monitor together, including the
//! race between a repayment and a liquidation of the same loan.

use bitloan_core::{Amount, Asset, LoanId, OwnerId};
use bitloan_lending::{
    CollateralLedger, LendingConfig, LendingError, LiquidationMonitor, LoanRegistry, LoanStatus,
    OriginationRequest,
};
use bitloan_oracle::PriceSnapshot;
use bitloan_risk::{assess, BorrowerSignals, RiskConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, Barrier};
use std::thread;

fn owner(id: &str) -> OwnerId {
    OwnerId::new(id).unwrap()
}

fn setup() -> Arc<LoanRegistry> {
    Arc::new(LoanRegistry::new(
        Arc::new(CollateralLedger::new()),
        LendingConfig::default(),
    ))
}

fn open_loan(registry: &LoanRegistry, who: &OwnerId, collateral: Decimal, borrowed: Decimal) -> LoanId {
    registry
        .ledger()
        .deposit(who, Amount::new(collateral).unwrap())
        .unwrap();
    let terms = assess(
        &RiskConfig::default(),
        collateral * dec!(45000),
        borrowed,
        &BorrowerSignals::default(),
    )
    .unwrap();
    registry
        .originate(
            OriginationRequest {
                owner: who.clone(),
                collateral_amount: collateral,
                borrowed_amount: borrowed,
                borrowed_asset: Asset::Usdc,
                borrowed_value: borrowed,
            },
            &terms,
        )
        .unwrap()
        .id
}

/// Test: originate → full repay returns exactly the collateral
#[test]
fn test_round_trip_returns_collateral() {
    let registry = setup();
    let alice = owner("alice");

    let loan_id = open_loan(&registry, &alice, dec!(0.75), dec!(15000));
    let during = registry.ledger().account(&alice).unwrap();
    assert!(during.available.is_zero());
    assert_eq!(during.locked.value(), dec!(0.75));

    registry.repay(loan_id, dec!(15000)).unwrap();

    let after = registry.ledger().account(&alice).unwrap();
    assert_eq!(after.available.value(), dec!(0.75));
    assert!(after.locked.is_zero());

    let withdrawn = registry
        .ledger()
        .withdraw(&alice, Amount::new(dec!(0.75)).unwrap())
        .unwrap();
    assert!(withdrawn.available.is_zero());
}

/// Test: status never leaves a terminal state
#[test]
fn test_status_is_monotonic() {
    let registry = setup();
    let alice = owner("alice");
    let monitor = LiquidationMonitor::new();

    let repaid = open_loan(&registry, &alice, dec!(1), dec!(30000));
    registry.repay(repaid, dec!(30000)).unwrap();

    let crash = PriceSnapshot::new()
        .with_price(Asset::CkBtc, dec!(1000))
        .with_price(Asset::Usdc, dec!(1));
    assert!(monitor.check(&registry, &crash).unwrap().is_empty());
    assert_eq!(registry.get_loan(repaid).unwrap().status, LoanStatus::Repaid);

    let liquidated = open_loan(&registry, &alice, dec!(1), dec!(30000));
    assert_eq!(monitor.check(&registry, &crash).unwrap().len(), 1);
    assert!(matches!(
        registry.repay(liquidated, dec!(30000)),
        Err(LendingError::LoanNotActive {
            status: LoanStatus::Liquidated,
            ..
        })
    ));
    assert_eq!(
        registry.get_loan(liquidated).unwrap().status,
        LoanStatus::Liquidated
    );
}

/// Test: locked collateral is never withdrawable while the loan is active
#[test]
fn test_locked_collateral_stays_locked() {
    let registry = setup();
    let alice = owner("alice");
    open_loan(&registry, &alice, dec!(1), dec!(10000));
    registry
        .ledger()
        .deposit(&alice, Amount::new(dec!(0.2)).unwrap())
        .unwrap();

    let result = registry
        .ledger()
        .withdraw(&alice, Amount::new(dec!(0.3)).unwrap());
    assert!(matches!(
        result,
        Err(LendingError::InsufficientAvailableBalance { .. })
    ));

    let account = registry
        .ledger()
        .withdraw(&alice, Amount::new(dec!(0.2)).unwrap())
        .unwrap();
    assert!(account.available.is_zero());
    assert_eq!(account.locked.value(), dec!(1));
}

/// Test: a concurrent repay and liquidation resolve to exactly one winner
#[test]
fn test_repay_races_liquidation() {
    for round in 0..50 {
        let registry = setup();
        let alice = owner(&format!("alice-{}", round));
        let loan_id = open_loan(&registry, &alice, dec!(1), dec!(30000));

        // 115% live ratio with a 120% threshold
        let crash = PriceSnapshot::new()
            .with_price(Asset::CkBtc, dec!(34500))
            .with_price(Asset::Usdc, dec!(1));
        let barrier = Arc::new(Barrier::new(2));

        let liquidator = {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                LiquidationMonitor::new().check(&registry, &crash).unwrap()
            })
        };
        let repayer = {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.repay(loan_id, dec!(30000))
            })
        };

        let liquidations = liquidator.join().unwrap();
        let repayment = repayer.join().unwrap();
        let loan = registry.get_loan(loan_id).unwrap();
        let account = registry.ledger().account(&alice).unwrap();

        match loan.status {
            LoanStatus::Repaid => {
                assert!(repayment.is_ok());
                assert!(liquidations.is_empty());
                assert_eq!(account.available.value(), dec!(1));
            }
            LoanStatus::Liquidated => {
                assert!(matches!(
                    repayment,
                    Err(LendingError::LoanNotActive { .. })
                ));
                assert_eq!(liquidations.len(), 1);
                assert!(account.available.is_zero());
            }
            LoanStatus::Active => panic!("loan left active after race"),
        }
        assert!(account.locked.is_zero());
    }
}

/// Test: owners do not interfere with each other under concurrent load
#[test]
fn test_parallel_owners() {
    let registry = setup();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let who = owner(&format!("owner-{}", i));
                for _ in 0..10 {
                    let loan_id = open_loan(&registry, &who, dec!(0.1), dec!(1000));
                    registry.repay(loan_id, dec!(1000)).unwrap();
                }
                who
            })
        })
        .collect();

    for handle in handles {
        let who = handle.join().unwrap();
        let account = registry.ledger().account(&who).unwrap();
        assert_eq!(account.available.value(), dec!(1.0));
        assert!(account.locked.is_zero());
        assert_eq!(registry.list_loans(&who).len(), 10);
    }
    assert!(registry.active_loan_ids().is_empty());
}
