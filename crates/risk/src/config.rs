//! Risk configuration with tunable thresholds
//!
//! Every constant that shapes loan terms lives here so it can be tuned from
//! a config file without recompiling. Defaults reproduce the standard BitLoan
//! terms: 75% LTV, 120% collateral ratio floor, 3.5% rate floor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RiskError;

/// Configuration for the risk assessment engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    // === Risk tiers ===
    /// Coverage ratio at or above which a request is Low risk
    #[serde(default = "default_low_risk_coverage")]
    pub low_risk_coverage: Decimal,

    /// Coverage ratio at or above which a request is Medium risk
    #[serde(default = "default_medium_risk_coverage")]
    pub medium_risk_coverage: Decimal,

    // === Collateral ratio ===
    /// Required ratio (%) before the coverage discount
    #[serde(default = "default_collateral_ratio_base")]
    pub collateral_ratio_base: Decimal,

    /// Percentage points removed per unit of coverage
    #[serde(default = "default_collateral_ratio_slope")]
    pub collateral_ratio_slope: Decimal,

    /// Floor for the personalized collateral ratio (%)
    #[serde(default = "default_min_collateral_ratio")]
    pub min_collateral_ratio: Decimal,

    // === Loan size and pricing ===
    /// Maximum fraction of collateral value that may be borrowed
    #[serde(default = "default_loan_to_value")]
    pub loan_to_value: Decimal,

    /// Rate (%) before the coverage discount
    #[serde(default = "default_base_interest_rate")]
    pub base_interest_rate: Decimal,

    /// Floor for the interest rate (%)
    #[serde(default = "default_min_interest_rate")]
    pub min_interest_rate: Decimal,

    /// Collateral ratio (%) at or below which a loan is liquidated
    #[serde(default = "default_liquidation_threshold")]
    pub liquidation_threshold: Decimal,

    // === Scoring ===
    #[serde(default)]
    pub weights: FactorWeights,

    /// Factor score at or above which the impact is positive
    #[serde(default = "default_positive_impact_score")]
    pub positive_impact_score: Decimal,

    /// Factor score at or below which the impact is negative
    #[serde(default = "default_negative_impact_score")]
    pub negative_impact_score: Decimal,
}

/// Relative weight of each factor in the overall risk score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    #[serde(default = "default_collateral_health_weight")]
    pub collateral_health: Decimal,
    #[serde(default = "default_market_volatility_weight")]
    pub market_volatility: Decimal,
    #[serde(default = "default_wallet_history_weight")]
    pub wallet_history: Decimal,
    #[serde(default = "default_network_activity_weight")]
    pub network_activity: Decimal,
}

impl FactorWeights {
    pub fn total(&self) -> Decimal {
        self.collateral_health + self.market_volatility + self.wallet_history + self.network_activity
    }
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            collateral_health: default_collateral_health_weight(),
            market_volatility: default_market_volatility_weight(),
            wallet_history: default_wallet_history_weight(),
            network_activity: default_network_activity_weight(),
        }
    }
}

// Default value functions for serde
fn default_low_risk_coverage() -> Decimal {
    Decimal::new(18, 1)
}

fn default_medium_risk_coverage() -> Decimal {
    Decimal::new(15, 1)
}

fn default_collateral_ratio_base() -> Decimal {
    Decimal::from(200)
}

fn default_collateral_ratio_slope() -> Decimal {
    Decimal::from(50)
}

fn default_min_collateral_ratio() -> Decimal {
    Decimal::from(120)
}

fn default_loan_to_value() -> Decimal {
    Decimal::new(75, 2)
}

fn default_base_interest_rate() -> Decimal {
    Decimal::from(8)
}

fn default_min_interest_rate() -> Decimal {
    Decimal::new(35, 1)
}

fn default_liquidation_threshold() -> Decimal {
    Decimal::from(120)
}

fn default_positive_impact_score() -> Decimal {
    Decimal::from(70)
}

fn default_negative_impact_score() -> Decimal {
    Decimal::from(40)
}

fn default_collateral_health_weight() -> Decimal {
    Decimal::new(40, 2)
}

fn default_market_volatility_weight() -> Decimal {
    Decimal::new(20, 2)
}

fn default_wallet_history_weight() -> Decimal {
    Decimal::new(25, 2)
}

fn default_network_activity_weight() -> Decimal {
    Decimal::new(15, 2)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            low_risk_coverage: default_low_risk_coverage(),
            medium_risk_coverage: default_medium_risk_coverage(),
            collateral_ratio_base: default_collateral_ratio_base(),
            collateral_ratio_slope: default_collateral_ratio_slope(),
            min_collateral_ratio: default_min_collateral_ratio(),
            loan_to_value: default_loan_to_value(),
            base_interest_rate: default_base_interest_rate(),
            min_interest_rate: default_min_interest_rate(),
            liquidation_threshold: default_liquidation_threshold(),
            weights: FactorWeights::default(),
            positive_impact_score: default_positive_impact_score(),
            negative_impact_score: default_negative_impact_score(),
        }
    }
}

impl RiskConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Reject configurations that would produce meaningless terms
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.medium_risk_coverage > self.low_risk_coverage {
            return Err(RiskError::Config(
                "medium_risk_coverage must not exceed low_risk_coverage".to_string(),
            ));
        }
        if self.loan_to_value <= Decimal::ZERO || self.loan_to_value > Decimal::ONE {
            return Err(RiskError::Config(format!(
                "loan_to_value must be in (0, 1], got {}",
                self.loan_to_value
            )));
        }
        if self.min_interest_rate < Decimal::ZERO {
            return Err(RiskError::Config("min_interest_rate cannot be negative".to_string()));
        }
        if self.liquidation_threshold <= Decimal::ZERO {
            return Err(RiskError::Config(
                "liquidation_threshold must be positive".to_string(),
            ));
        }
        if self.min_collateral_ratio < self.liquidation_threshold {
            return Err(RiskError::Config(
                "min_collateral_ratio must be at least the liquidation_threshold".to_string(),
            ));
        }
        let weights = [
            self.weights.collateral_health,
            self.weights.market_volatility,
            self.weights.wallet_history,
            self.weights.network_activity,
        ];
        if weights.iter().any(|w| *w < Decimal::ZERO) || self.weights.total() <= Decimal::ZERO {
            return Err(RiskError::Config(
                "factor weights must be non-negative with a positive total".to_string(),
            ));
        }
        if self.negative_impact_score >= self.positive_impact_score {
            return Err(RiskError::Config(
                "negative_impact_score must be below positive_impact_score".to_string(),
            ));
        }
        Ok(())
    }
}
