//! Interest accrual
//!
//! Simple (non-compounding) interest on the principal, for display. Accrual
//! stops at the due date, or earlier if the loan was closed. Repayment is
//! still judged against the principal alone.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::loan::Loan;

const SECONDS_PER_DAY: i64 = 86_400;

/// Interest accrual calculator
#[derive(Debug, Clone)]
pub struct InterestCalculator {
    /// Day count for annualized rates
    days_per_year: Decimal,
}

impl InterestCalculator {
    /// Create a calculator using a 365-day year
    pub fn new() -> Self {
        Self::with_days_per_year(365)
    }

    pub fn with_days_per_year(days: u32) -> Self {
        Self {
            days_per_year: Decimal::from(days.max(1)),
        }
    }

    /// Fractional days between origination and `at`, capped at the due date
    /// and at the close time
    pub fn elapsed_days(&self, loan: &Loan, at: DateTime<Utc>) -> Decimal {
        let mut end = at.min(loan.due_date);
        if let Some(closed_at) = loan.closed_at {
            end = end.min(closed_at);
        }
        let seconds = end
            .signed_duration_since(loan.originated_at)
            .num_seconds()
            .max(0);
        Decimal::from(seconds) / Decimal::from(SECONDS_PER_DAY)
    }

    /// Interest accrued up to `at`
    ///
    /// accrued = principal × (rate / 100 × elapsed_days / days_per_year)
    ///
    /// Saturates at `Decimal::MAX` for principals near the top of the range.
    pub fn accrued(&self, loan: &Loan, at: DateTime<Utc>) -> Decimal {
        let fraction = loan.interest_rate / Decimal::ONE_HUNDRED * self.elapsed_days(loan, at)
            / self.days_per_year;
        loan.borrowed_amount.value().saturating_mul(fraction)
    }

    /// Principal plus accrued interest at `at`
    pub fn amount_due(&self, loan: &Loan, at: DateTime<Utc>) -> Decimal {
        loan.borrowed_amount
            .value()
            .saturating_add(self.accrued(loan, at))
    }

    /// Interest over the full term
    pub fn term_interest(&self, loan: &Loan) -> Decimal {
        self.accrued(loan, loan.due_date)
    }
}

impl Default for InterestCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::tests::sample_loan;
    use crate::loan::LoanStatus;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_no_interest_at_origination() {
        let loan = sample_loan();
        let calc = InterestCalculator::new();
        assert_eq!(calc.accrued(&loan, loan.originated_at), Decimal::ZERO);
        assert_eq!(calc.amount_due(&loan, loan.originated_at), dec!(30000));
    }

    #[test]
    fn test_accrual_is_linear() {
        // 30000 at 7.3% for 10 days = 60
        let mut loan = sample_loan();
        loan.interest_rate = dec!(7.3);
        let calc = InterestCalculator::new();

        let at = loan.originated_at + Duration::days(10);
        assert_eq!(calc.accrued(&loan, at), dec!(60));
        assert_eq!(calc.amount_due(&loan, at), dec!(30060));
    }

    #[test]
    fn test_accrual_capped_at_due_date() {
        let mut loan = sample_loan();
        loan.interest_rate = dec!(7.3);
        let calc = InterestCalculator::new();

        let late = loan.due_date + Duration::days(100);
        assert_eq!(calc.elapsed_days(&loan, late), dec!(30));
        assert_eq!(calc.accrued(&loan, late), dec!(180));
        assert_eq!(calc.term_interest(&loan), dec!(180));
    }

    #[test]
    fn test_accrual_stops_when_closed() {
        let mut loan = sample_loan();
        loan.interest_rate = dec!(7.3);
        loan.status = LoanStatus::Repaid;
        loan.closed_at = Some(loan.originated_at + Duration::days(5));

        let calc = InterestCalculator::new();
        assert_eq!(calc.accrued(&loan, loan.due_date), dec!(30));
    }

    #[test]
    fn test_amount_due_saturates() {
        let mut loan = sample_loan();
        loan.borrowed_amount = bitloan_core::Amount::new(Decimal::MAX).unwrap();
        let calc = InterestCalculator::new();
        assert_eq!(calc.amount_due(&loan, loan.due_date), Decimal::MAX);
    }

    #[test]
    fn test_before_origination_is_zero() {
        let loan = sample_loan();
        let calc = InterestCalculator::new();
        assert_eq!(
            calc.accrued(&loan, loan.originated_at - Duration::days(1)),
            Decimal::ZERO
        );
    }
}
