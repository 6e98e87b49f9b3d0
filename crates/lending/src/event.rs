//! Loan events - the journal record of every committed transition

use bitloan_core::{Amount, LoanId, OwnerId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::loan::Loan;

/// A committed state change (or liquidation warning)
///
/// Replaying the state-changing variants in order rebuilds the collateral
/// ledger and loan registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoanEvent {
    CollateralDeposited {
        owner: OwnerId,
        amount: Amount,
        at: DateTime<Utc>,
    },

    CollateralWithdrawn {
        owner: OwnerId,
        amount: Amount,
        at: DateTime<Utc>,
    },

    LoanOriginated { loan: Loan },

    LoanRepaid {
        loan_id: LoanId,
        owner: OwnerId,
        amount: Amount,
        at: DateTime<Utc>,
    },

    LoanLiquidated {
        loan_id: LoanId,
        owner: OwnerId,
        live_collateral_ratio: Decimal,
        collateral_seized: Amount,
        at: DateTime<Utc>,
    },

    /// Non-terminal; replay ignores it
    LiquidationWarning {
        loan_id: LoanId,
        owner: OwnerId,
        live_collateral_ratio: Decimal,
        liquidation_threshold: Decimal,
        at: DateTime<Utc>,
    },
}

impl LoanEvent {
    pub fn owner(&self) -> &OwnerId {
        match self {
            LoanEvent::CollateralDeposited { owner, .. }
            | LoanEvent::CollateralWithdrawn { owner, .. }
            | LoanEvent::LoanRepaid { owner, .. }
            | LoanEvent::LoanLiquidated { owner, .. }
            | LoanEvent::LiquidationWarning { owner, .. } => owner,
            LoanEvent::LoanOriginated { loan } => &loan.owner,
        }
    }

    pub fn loan_id(&self) -> Option<LoanId> {
        match self {
            LoanEvent::LoanOriginated { loan } => Some(loan.id),
            LoanEvent::LoanRepaid { loan_id, .. }
            | LoanEvent::LoanLiquidated { loan_id, .. }
            | LoanEvent::LiquidationWarning { loan_id, .. } => Some(*loan_id),
            LoanEvent::CollateralDeposited { .. } | LoanEvent::CollateralWithdrawn { .. } => None,
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            LoanEvent::CollateralDeposited { .. } => "collateral_deposited",
            LoanEvent::CollateralWithdrawn { .. } => "collateral_withdrawn",
            LoanEvent::LoanOriginated { .. } => "loan_originated",
            LoanEvent::LoanRepaid { .. } => "loan_repaid",
            LoanEvent::LoanLiquidated { .. } => "loan_liquidated",
            LoanEvent::LiquidationWarning { .. } => "liquidation_warning",
        }
    }

    /// Whether replaying this event changes state
    pub fn is_state_change(&self) -> bool {
        !matches!(self, LoanEvent::LiquidationWarning { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_json_is_tagged() {
        let event = LoanEvent::CollateralDeposited {
            owner: OwnerId::new("alice").unwrap(),
            amount: Amount::new(dec!(0.5)).unwrap(),
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CollateralDeposited");
        assert_eq!(json["owner"], "alice");
        assert_eq!(json["amount"], "0.5");
        assert!(event.loan_id().is_none());
    }

    #[test]
    fn test_warning_is_not_a_state_change() {
        let event = LoanEvent::LiquidationWarning {
            loan_id: LoanId::generate(),
            owner: OwnerId::new("alice").unwrap(),
            live_collateral_ratio: dec!(135),
            liquidation_threshold: dec!(120),
            at: Utc::now(),
        };
        assert!(!event.is_state_change());
        assert_eq!(event.kind(), "liquidation_warning");
        assert_eq!(event.owner().as_str(), "alice");
    }
}
