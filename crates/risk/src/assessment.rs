//! Risk assessment output

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::factor::RiskFactor;

/// Risk tier derived from the coverage ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Personalized loan terms for one borrow request.
///
/// Ephemeral: recomputed per request and never persisted on its own. The
/// binding fields are copied onto the loan at origination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0-100, higher is a healthier borrower profile
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    /// collateral value / requested value
    pub coverage_ratio: Decimal,
    /// Required collateral ratio (%)
    pub personalized_collateral_ratio: Decimal,
    /// Ceiling on the borrowed value, in the reference currency
    pub max_loan_amount: Decimal,
    /// Annual rate (%)
    pub interest_rate: Decimal,
    /// Collateral ratio (%) at or below which the loan is liquidated
    pub liquidation_threshold: Decimal,
    pub factors: Vec<RiskFactor>,
    /// Advisory only
    pub recommendations: Vec<String>,
}

impl RiskAssessment {
    pub fn factor(&self, name: &str) -> Option<&RiskFactor> {
        self.factors.iter().find(|f| f.name == name)
    }
}
