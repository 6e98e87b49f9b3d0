//! Risk engine errors

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("Invalid input: {field} {reason}, got {value}")]
    InvalidInput {
        field: &'static str,
        value: Decimal,
        reason: &'static str,
    },

    #[error("Invalid risk configuration: {0}")]
    Config(String),

    #[error("Borrower signals unavailable for {owner}: {reason}")]
    SignalsUnavailable { owner: String, reason: String },
}

impl RiskError {
    pub(crate) fn not_positive(field: &'static str, value: Decimal) -> Self {
        RiskError::InvalidInput {
            field,
            value,
            reason: "must be greater than zero",
        }
    }

    pub(crate) fn out_of_range(field: &'static str, value: Decimal) -> Self {
        RiskError::InvalidInput {
            field,
            value,
            reason: "is outside the representable range",
        }
    }
}
