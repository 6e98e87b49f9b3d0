//! Risk factors - named sub-scores that make up the overall risk score
//!
//! Each factor maps one auditable input to a 0-100 score where higher is
//! healthier:
//!
//! | factor | formula |
//! |---|---|
//! | Collateral Health | `min(100, coverage * 50)` |
//! | Market Volatility | `clamp(100 - volatility%, 0, 100)` |
//! | Wallet History | `clamp(50 + min(age_days / 10, 20) + min(repaid * 5, 30) - liquidated * 25, 0, 100)` |
//! | Network Activity | `min(100, active_days * 2 + min(transactions, 40))` |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::config::RiskConfig;
use crate::signals::BorrowerSignals;

const MAX_SCORE: Decimal = Decimal::ONE_HUNDRED;

/// How a factor moves the assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Impact {
    Positive,
    Negative,
    Neutral,
}

impl Impact {
    /// Classify a score against the configured impact bands
    pub fn from_score(score: Decimal, config: &RiskConfig) -> Self {
        if score >= config.positive_impact_score {
            Impact::Positive
        } else if score <= config.negative_impact_score {
            Impact::Negative
        } else {
            Impact::Neutral
        }
    }
}

/// One named sub-score with its rationale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub impact: Impact,
    /// 0-100, higher is healthier
    pub score: Decimal,
    pub description: String,
}

impl RiskFactor {
    fn new(name: &str, score: Decimal, description: String, config: &RiskConfig) -> Self {
        Self {
            name: name.to_string(),
            impact: Impact::from_score(score, config),
            score,
            description,
        }
    }
}

fn clamp_score(score: Decimal) -> Decimal {
    score.max(Decimal::ZERO).min(MAX_SCORE)
}

pub const COLLATERAL_HEALTH: &str = "Collateral Health";
pub const MARKET_VOLATILITY: &str = "Market Volatility";
pub const WALLET_HISTORY: &str = "Wallet History";
pub const NETWORK_ACTIVITY: &str = "Network Activity";

pub fn collateral_health(coverage_ratio: Decimal, config: &RiskConfig) -> RiskFactor {
    let score = clamp_score(
        coverage_ratio
            .checked_mul(Decimal::from(50))
            .unwrap_or(MAX_SCORE),
    );
    RiskFactor::new(
        COLLATERAL_HEALTH,
        score,
        format!(
            "Collateral covers {}x the requested amount",
            coverage_ratio.round_dp(2).normalize()
        ),
        config,
    )
}

pub fn market_volatility(signals: &BorrowerSignals, config: &RiskConfig) -> RiskFactor {
    let score = clamp_score(MAX_SCORE - signals.market_volatility);
    let description = if score >= config.positive_impact_score {
        "Collateral volatility is within normal ranges".to_string()
    } else {
        format!(
            "Collateral volatility is elevated at {}% annualized",
            signals.market_volatility.normalize()
        )
    };
    RiskFactor::new(MARKET_VOLATILITY, score, description, config)
}

pub fn wallet_history(signals: &BorrowerSignals, config: &RiskConfig) -> RiskFactor {
    let age_bonus = Decimal::from(signals.wallet_age_days / 10).min(Decimal::from(20));
    let repaid_bonus = Decimal::from(signals.repaid_loans.saturating_mul(5)).min(Decimal::from(30));
    let liquidation_penalty = Decimal::from(signals.liquidated_loans) * Decimal::from(25);
    let score = clamp_score(Decimal::from(50) + age_bonus + repaid_bonus - liquidation_penalty);

    let description = format!(
        "{} repaid and {} liquidated loans over {} days",
        signals.repaid_loans, signals.liquidated_loans, signals.wallet_age_days
    );
    RiskFactor::new(WALLET_HISTORY, score, description, config)
}

pub fn network_activity(signals: &BorrowerSignals, config: &RiskConfig) -> RiskFactor {
    let days = Decimal::from(signals.active_days_last_30_days.min(30)) * Decimal::from(2);
    let transactions = Decimal::from(signals.transactions_last_30_days.min(40));
    let score = clamp_score(days + transactions);

    let description = format!(
        "{} transactions across {} active days in the last 30 days",
        signals.transactions_last_30_days, signals.active_days_last_30_days
    );
    RiskFactor::new(NETWORK_ACTIVITY, score, description, config)
}
