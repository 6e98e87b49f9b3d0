//! Liquidation monitor
//!
//! Recomputes the live collateral ratio of every active loan against a price
//! snapshot. Loans at or below their liquidation threshold are liquidated;
//! loans within the warning band above it produce a non-terminal warning.

use bitloan_core::{Amount, LoanId, OwnerId};
use bitloan_oracle::PriceSnapshot;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::{info, warn};

use crate::error::LendingError;
use crate::event::LoanEvent;
use crate::registry::{Evaluation, LoanRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum LiquidationKind {
    Liquidated,
    Warning,
}

/// Outcome of a liquidation check for one loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationEvent {
    pub loan_id: LoanId,
    pub owner: OwnerId,
    pub kind: LiquidationKind,
    /// Live collateral ratio (%)
    pub live_collateral_ratio: Decimal,
    pub liquidation_threshold: Decimal,
    /// Zero for warnings
    pub collateral_seized: Amount,
    pub at: DateTime<Utc>,
}

impl LiquidationEvent {
    pub fn is_liquidation(&self) -> bool {
        self.kind == LiquidationKind::Liquidated
    }

    /// Journal form of this event
    pub fn to_loan_event(&self) -> LoanEvent {
        match self.kind {
            LiquidationKind::Liquidated => LoanEvent::LoanLiquidated {
                loan_id: self.loan_id,
                owner: self.owner.clone(),
                live_collateral_ratio: self.live_collateral_ratio,
                collateral_seized: self.collateral_seized,
                at: self.at,
            },
            LiquidationKind::Warning => LoanEvent::LiquidationWarning {
                loan_id: self.loan_id,
                owner: self.owner.clone(),
                live_collateral_ratio: self.live_collateral_ratio,
                liquidation_threshold: self.liquidation_threshold,
                at: self.at,
            },
        }
    }
}

/// Liquidation monitor
#[derive(Debug, Default)]
pub struct LiquidationMonitor;

impl LiquidationMonitor {
    pub fn new() -> Self {
        Self
    }

    /// Check every active loan against `snapshot`
    ///
    /// Closed loans are skipped, so running the same check twice liquidates
    /// nothing new. A snapshot holding a non-positive price is rejected before
    /// any loan is touched. Once the sweep starts, a loan that cannot be
    /// evaluated is logged and skipped so every liquidation already applied
    /// is still returned.
    pub fn check(
        &self,
        registry: &LoanRegistry,
        snapshot: &PriceSnapshot,
    ) -> Result<Vec<LiquidationEvent>, LendingError> {
        if let Some((asset, price)) = snapshot.iter().find(|(_, price)| **price <= Decimal::ZERO) {
            return Err(LendingError::InvalidInput(format!(
                "price for {} must be greater than zero, got {}",
                asset, price
            )));
        }

        let mut events = Vec::new();
        for loan_id in registry.active_loan_ids() {
            let evaluation = match registry.evaluate(loan_id, snapshot) {
                Ok(evaluation) => evaluation,
                Err(e) => {
                    warn!(loan_id = %loan_id, error = %e, "loan could not be evaluated, skipped");
                    continue;
                }
            };
            match evaluation {
                Evaluation::Liquidated {
                    loan,
                    live_ratio,
                    at,
                } => {
                    info!(
                        loan_id = %loan.id,
                        owner = %loan.owner,
                        live_ratio = %live_ratio,
                        threshold = %loan.liquidation_threshold,
                        seized = %loan.collateral_amount,
                        "loan liquidated"
                    );
                    events.push(LiquidationEvent {
                        loan_id: loan.id,
                        owner: loan.owner,
                        kind: LiquidationKind::Liquidated,
                        live_collateral_ratio: live_ratio,
                        liquidation_threshold: loan.liquidation_threshold,
                        collateral_seized: loan.collateral_amount,
                        at,
                    });
                }
                Evaluation::Warning {
                    loan,
                    live_ratio,
                    at,
                } => {
                    warn!(
                        loan_id = %loan.id,
                        owner = %loan.owner,
                        live_ratio = %live_ratio,
                        threshold = %loan.liquidation_threshold,
                        "loan approaching liquidation"
                    );
                    events.push(LiquidationEvent {
                        loan_id: loan.id,
                        owner: loan.owner,
                        kind: LiquidationKind::Warning,
                        live_collateral_ratio: live_ratio,
                        liquidation_threshold: loan.liquidation_threshold,
                        collateral_seized: Amount::ZERO,
                        at,
                    });
                }
                Evaluation::Unpriced(asset) => {
                    warn!(loan_id = %loan_id, asset = %asset, "no price in snapshot, loan skipped");
                }
                Evaluation::Healthy | Evaluation::Inactive => {}
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LendingConfig;
    use crate::ledger::CollateralLedger;
    use crate::loan::LoanStatus;
    use crate::registry::OriginationRequest;
    use bitloan_core::Asset;
    use bitloan_risk::{assess, BorrowerSignals, RiskConfig};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn open_loan(registry: &LoanRegistry, who: &str, collateral: Decimal, borrowed: Decimal) -> LoanId {
        let owner = OwnerId::new(who).unwrap();
        registry
            .ledger()
            .deposit(&owner, Amount::new(collateral).unwrap())
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
                    owner,
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

    fn prices(btc: Decimal) -> PriceSnapshot {
        PriceSnapshot::new()
            .with_price(Asset::CkBtc, btc)
            .with_price(Asset::Usdc, dec!(1))
    }

    fn registry() -> LoanRegistry {
        LoanRegistry::new(Arc::new(CollateralLedger::new()), LendingConfig::default())
    }

    #[test]
    fn test_liquidates_at_115_percent() {
        let registry = registry();
        let loan_id = open_loan(&registry, "alice", dec!(1), dec!(30000));

        let events = LiquidationMonitor::new().check(&registry, &prices(dec!(34500))).unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.loan_id, loan_id);
        assert!(event.is_liquidation());
        assert_eq!(event.live_collateral_ratio, dec!(115));
        assert_eq!(event.collateral_seized.value(), dec!(1));
        assert_eq!(registry.get_loan(loan_id).unwrap().status, LoanStatus::Liquidated);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let registry = registry();
        let loan_id = open_loan(&registry, "alice", dec!(1), dec!(30000));

        let events = LiquidationMonitor::new().check(&registry, &prices(dec!(36000))).unwrap();
        assert_eq!(events[0].kind, LiquidationKind::Liquidated);
        assert_eq!(events[0].live_collateral_ratio, dec!(120));
        assert!(!registry.get_loan(loan_id).unwrap().is_active());
    }

    #[test]
    fn test_warning_band_is_non_terminal() {
        let registry = registry();
        let loan_id = open_loan(&registry, "alice", dec!(1), dec!(30000));

        // 130%
        let events = LiquidationMonitor::new().check(&registry, &prices(dec!(39000))).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, LiquidationKind::Warning);
        assert!(events[0].collateral_seized.is_zero());
        assert!(registry.get_loan(loan_id).unwrap().is_active());
        assert!(matches!(
            events[0].to_loan_event(),
            LoanEvent::LiquidationWarning { .. }
        ));
    }

    #[test]
    fn test_healthy_loans_produce_nothing() {
        let registry = registry();
        open_loan(&registry, "alice", dec!(1), dec!(30000));

        let events = LiquidationMonitor::new().check(&registry, &prices(dec!(45000))).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_check_is_idempotent() {
        let registry = registry();
        open_loan(&registry, "alice", dec!(1), dec!(30000));
        let monitor = LiquidationMonitor::new();
        let crash = prices(dec!(20000));

        assert_eq!(monitor.check(&registry, &crash).unwrap().len(), 1);
        assert!(monitor.check(&registry, &crash).unwrap().is_empty());
    }

    #[test]
    fn test_non_positive_price_rejected_before_any_change() {
        let registry = registry();
        let loan_id = open_loan(&registry, "alice", dec!(1), dec!(30000));

        let snapshot = PriceSnapshot::new()
            .with_price(Asset::CkBtc, dec!(20000))
            .with_price(Asset::Usdc, Decimal::ZERO);
        let result = LiquidationMonitor::new().check(&registry, &snapshot);

        assert!(matches!(result, Err(LendingError::InvalidInput(_))));
        assert!(registry.get_loan(loan_id).unwrap().is_active());
    }

    #[test]
    fn test_unpriced_loans_are_skipped() {
        let registry = registry();
        let loan_id = open_loan(&registry, "alice", dec!(1), dec!(30000));

        let snapshot = PriceSnapshot::new().with_price(Asset::CkBtc, dec!(20000));
        let events = LiquidationMonitor::new().check(&registry, &snapshot).unwrap();

        assert!(events.is_empty());
        assert!(registry.get_loan(loan_id).unwrap().is_active());
    }

    #[test]
    fn test_unevaluable_loan_does_not_abort_sweep() {
        let registry = registry();
        let underwater = open_loan(&registry, "alice", dec!(1), dec!(30000));

        // 1e25 ckBTC at 34500 has no representable value
        let whale = OwnerId::new("whale").unwrap();
        let huge = dec!(10000000000000000000000000);
        registry.ledger().deposit(&whale, Amount::new(huge).unwrap()).unwrap();
        let terms = assess(
            &RiskConfig::default(),
            dec!(2000),
            dec!(1000),
            &BorrowerSignals::default(),
        )
        .unwrap();
        let unpriceable = registry
            .originate(
                OriginationRequest {
                    owner: whale,
                    collateral_amount: huge,
                    borrowed_amount: dec!(1000),
                    borrowed_asset: Asset::Usdc,
                    borrowed_value: dec!(1000),
                },
                &terms,
            )
            .unwrap()
            .id;

        let events = LiquidationMonitor::new().check(&registry, &prices(dec!(34500))).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].loan_id, underwater);
        assert!(events[0].is_liquidation());
        assert_eq!(registry.get_loan(underwater).unwrap().status, LoanStatus::Liquidated);
        assert!(registry.get_loan(unpriceable).unwrap().is_active());
    }

    #[test]
    fn test_only_underwater_loans_liquidated() {
        let registry = registry();
        let deep = open_loan(&registry, "alice", dec!(1), dec!(33000));
        let safe = open_loan(&registry, "bob", dec!(2), dec!(20000));

        // alice: 30000/33000 = 90.9%, bob: 60000/20000 = 300%
        let events = LiquidationMonitor::new().check(&registry, &prices(dec!(30000))).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].loan_id, deep);
        assert!(registry.get_loan(safe).unwrap().is_active());
    }
}
