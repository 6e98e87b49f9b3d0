//! Lending errors
//!
//! Every variant is recoverable and is raised before any state changes.

use bitloan_core::{AmountError, LoanId, OwnerId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::loan::LoanStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LendingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient collateral for {owner}: required {required}, available {available}")]
    InsufficientCollateral {
        owner: OwnerId,
        required: Decimal,
        available: Decimal,
    },

    #[error("Insufficient available balance for {owner}: requested {requested}, available {available}")]
    InsufficientAvailableBalance {
        owner: OwnerId,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Requested value {requested} exceeds maximum loan amount {max}")]
    ExceedsMaxLoan { requested: Decimal, max: Decimal },

    #[error("Loan {loan_id} is not active (status: {status})")]
    LoanNotActive { loan_id: LoanId, status: LoanStatus },

    #[error("Repayment of {offered} does not cover loan {loan_id} principal {required}")]
    InsufficientRepayment {
        loan_id: LoanId,
        required: Decimal,
        offered: Decimal,
    },

    #[error("Loan not found: {0}")]
    LoanNotFound(LoanId),

    #[error("Collateral account not found: {0}")]
    AccountNotFound(OwnerId),
}

impl LendingError {
    /// True for the not-found family of errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LendingError::LoanNotFound(_) | LendingError::AccountNotFound(_)
        )
    }
}

impl From<AmountError> for LendingError {
    fn from(e: AmountError) -> Self {
        LendingError::InvalidInput(e.to_string())
    }
}
