//! Loan records

use bitloan_core::{Amount, Asset, LoanId, OwnerId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Loan lifecycle state
///
/// `Active` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum LoanStatus {
    Active,
    Repaid,
    Liquidated,
}

impl LoanStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoanStatus::Active)
    }
}

/// A collateralized loan
///
/// Terms are fixed at origination; only `status` and `closed_at` change, and
/// only once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub owner: OwnerId,

    pub collateral_asset: Asset,
    pub collateral_amount: Amount,

    pub borrowed_asset: Asset,
    pub borrowed_amount: Amount,
    /// Principal in the reference currency at origination
    pub borrowed_value: Decimal,

    /// Collateral ratio (%) required by the assessment
    pub collateral_ratio_at_origination: Decimal,
    /// Live ratio (%) at or below which the loan is liquidated
    pub liquidation_threshold: Decimal,
    /// Annual rate (%)
    pub interest_rate: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score_at_origination: Option<u8>,

    pub originated_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,

    pub status: LoanStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    pub fn is_overdue(&self, at: DateTime<Utc>) -> bool {
        self.is_active() && at > self.due_date
    }

    /// Live collateral ratio (%) at the given prices
    ///
    /// `None` when the borrowed side is worth nothing.
    pub fn live_collateral_ratio(
        &self,
        collateral_price: Decimal,
        borrowed_price: Decimal,
    ) -> Option<Decimal> {
        let collateral_value = self.collateral_amount.value().checked_mul(collateral_price)?;
        let debt_value = self.borrowed_amount.value().checked_mul(borrowed_price)?;
        if debt_value <= Decimal::ZERO {
            return None;
        }
        collateral_value
            .checked_div(debt_value)?
            .checked_mul(Decimal::ONE_HUNDRED)
    }

    /// Close the loan. Returns false if it already left `Active`.
    pub(crate) fn close(&mut self, status: LoanStatus, at: DateTime<Utc>) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.closed_at = Some(at);
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    pub(crate) fn sample_loan() -> Loan {
        let now = Utc::now();
        Loan {
            id: LoanId::generate(),
            owner: OwnerId::new("alice").unwrap(),
            collateral_asset: Asset::CkBtc,
            collateral_amount: Amount::new(dec!(1)).unwrap(),
            borrowed_asset: Asset::Usdc,
            borrowed_amount: Amount::new(dec!(30000)).unwrap(),
            borrowed_value: dec!(30000),
            collateral_ratio_at_origination: dec!(125),
            liquidation_threshold: dec!(120),
            interest_rate: dec!(6.5),
            risk_score_at_origination: Some(60),
            originated_at: now,
            due_date: now + Duration::days(30),
            status: LoanStatus::Active,
            closed_at: None,
        }
    }

    #[test]
    fn test_live_ratio() {
        let loan = sample_loan();
        assert_eq!(
            loan.live_collateral_ratio(dec!(34500), dec!(1)),
            Some(dec!(115))
        );
        assert_eq!(loan.live_collateral_ratio(dec!(45000), Decimal::ZERO), None);
    }

    #[test]
    fn test_close_is_one_way() {
        let mut loan = sample_loan();
        let at = Utc::now();

        assert!(loan.close(LoanStatus::Repaid, at));
        assert_eq!(loan.closed_at, Some(at));

        assert!(!loan.close(LoanStatus::Liquidated, Utc::now()));
        assert_eq!(loan.status, LoanStatus::Repaid);
        assert_eq!(loan.closed_at, Some(at));
    }

    #[test]
    fn test_cannot_close_to_active() {
        let mut loan = sample_loan();
        assert!(!loan.close(LoanStatus::Active, Utc::now()));
        assert!(loan.closed_at.is_none());
    }

    #[test]
    fn test_status_display_and_parse() {
        assert_eq!(LoanStatus::Liquidated.to_string(), "Liquidated");
        assert_eq!("Repaid".parse::<LoanStatus>().unwrap(), LoanStatus::Repaid);
    }

    #[test]
    fn test_overdue() {
        let loan = sample_loan();
        assert!(!loan.is_overdue(Utc::now()));
        assert!(loan.is_overdue(loan.due_date + Duration::seconds(1)));
    }
}
