//! Application configuration
//!
//! Loaded from a JSON file; every field is optional and falls back to the
//! standard terms.
//!
//! ```json
//! {
//!   "risk": { "loan_to_value": "0.7" },
//!   "lending": { "loan_term_days": 60 },
//!   "max_price_age_secs": 120,
//!   "prices": { "ckBTC": "52000" },
//!   "signals": { "alice": { "wallet_age_days": 400, "repaid_loans": 3 } }
//! }
//! ```

use bitloan_core::{Asset, OwnerId};
use bitloan_lending::LendingConfig;
use bitloan_risk::{BorrowerSignals, RiskConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub lending: LendingConfig,

    /// Oracle quotes older than this are rejected
    #[serde(default = "default_max_price_age_secs")]
    pub max_price_age_secs: u64,

    /// Price overrides for the built-in mock oracle
    #[serde(default)]
    pub prices: BTreeMap<Asset, Decimal>,

    /// Per-owner borrower signals; unknown owners get neutral defaults
    #[serde(default)]
    pub signals: BTreeMap<OwnerId, BorrowerSignals>,
}

fn default_max_price_age_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            risk: RiskConfig::default(),
            lending: LendingConfig::default(),
            max_price_age_secs: default_max_price_age_secs(),
            prices: BTreeMap::new(),
            signals: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.risk.validate()?;
        if self.lending.loan_term_days == 0 {
            return Err(AppError::Config("loan_term_days must be at least 1".to_string()));
        }
        if self.lending.warning_band < Decimal::ZERO {
            return Err(AppError::Config("warning_band cannot be negative".to_string()));
        }
        if let Some((asset, price)) = self.prices.iter().find(|(_, p)| **p <= Decimal::ZERO) {
            return Err(AppError::Config(format!(
                "price for {} must be positive, got {}",
                asset, price
            )));
        }
        Ok(())
    }
}
