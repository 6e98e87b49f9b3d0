//! Lending configuration

use bitloan_core::Asset;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Loan lifecycle parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingConfig {
    /// Asset posted as collateral
    #[serde(default = "default_collateral_asset")]
    pub collateral_asset: Asset,

    /// Days from origination to the due date
    #[serde(default = "default_loan_term_days")]
    pub loan_term_days: u32,

    /// Percentage points above the liquidation threshold that trigger a warning
    #[serde(default = "default_warning_band")]
    pub warning_band: Decimal,

    /// Day count used to annualize interest
    #[serde(default = "default_days_per_year")]
    pub days_per_year: u32,
}

fn default_collateral_asset() -> Asset {
    Asset::CkBtc
}

fn default_loan_term_days() -> u32 {
    30
}

fn default_warning_band() -> Decimal {
    Decimal::from(20)
}

fn default_days_per_year() -> u32 {
    365
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            collateral_asset: default_collateral_asset(),
            loan_term_days: default_loan_term_days(),
            warning_band: default_warning_band(),
            days_per_year: default_days_per_year(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LendingConfig::default();
        assert_eq!(config.collateral_asset, Asset::CkBtc);
        assert_eq!(config.loan_term_days, 30);
        assert_eq!(config.warning_band, Decimal::from(20));
    }

    #[test]
    fn test_partial_json() {
        let config: LendingConfig = serde_json::from_str(r#"{ "loan_term_days": 90 }"#).unwrap();
        assert_eq!(config.loan_term_days, 90);
        assert_eq!(config.collateral_asset, Asset::CkBtc);
        assert_eq!(config.days_per_year, 365);
    }
}
