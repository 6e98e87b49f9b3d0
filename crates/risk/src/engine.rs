//! Risk engine implementation

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::assessment::{RiskAssessment, RiskLevel};
use crate::config::RiskConfig;
use crate::error::RiskError;
use crate::factor::{self, Impact, RiskFactor};
use crate::signals::BorrowerSignals;

/// Assess a borrow request.
///
/// Pure: the result depends only on the arguments. Fails with
/// `RiskError::InvalidInput` if either value is not strictly positive, or if
/// the pair is so lopsided that the coverage ratio or loan cap cannot be
/// represented.
pub fn assess(
    config: &RiskConfig,
    collateral_value: Decimal,
    requested_value: Decimal,
    signals: &BorrowerSignals,
) -> Result<RiskAssessment, RiskError> {
    if collateral_value <= Decimal::ZERO {
        return Err(RiskError::not_positive("collateral_value", collateral_value));
    }
    if requested_value <= Decimal::ZERO {
        return Err(RiskError::not_positive("requested_value", requested_value));
    }

    let coverage_ratio = collateral_value
        .checked_div(requested_value)
        .filter(|ratio| *ratio > Decimal::ZERO)
        .ok_or_else(|| RiskError::out_of_range("collateral_value", collateral_value))?;

    let risk_level = if coverage_ratio >= config.low_risk_coverage {
        RiskLevel::Low
    } else if coverage_ratio >= config.medium_risk_coverage {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    };

    // A slope term too large to represent is far past the floor anyway
    let personalized_collateral_ratio = coverage_ratio
        .checked_mul(config.collateral_ratio_slope)
        .and_then(|slope| config.collateral_ratio_base.checked_sub(slope))
        .map_or(config.min_collateral_ratio, |ratio| {
            ratio.max(config.min_collateral_ratio)
        });
    let max_loan_amount = collateral_value
        .checked_mul(config.loan_to_value)
        .ok_or_else(|| RiskError::out_of_range("collateral_value", collateral_value))?;
    let interest_rate = config
        .base_interest_rate
        .checked_sub(coverage_ratio)
        .map_or(config.min_interest_rate, |rate| rate.max(config.min_interest_rate));

    let factors = vec![
        factor::collateral_health(coverage_ratio, config),
        factor::market_volatility(signals, config),
        factor::wallet_history(signals, config),
        factor::network_activity(signals, config),
    ];
    let risk_score = overall_score(&factors, config);
    let recommendations = recommendations(coverage_ratio, &factors, config);

    Ok(RiskAssessment {
        risk_score,
        risk_level,
        coverage_ratio,
        personalized_collateral_ratio,
        max_loan_amount,
        interest_rate,
        liquidation_threshold: config.liquidation_threshold,
        factors,
        recommendations,
    })
}

/// Weighted mean of the factor scores, clamped to 0-100 and rounded half-up
fn overall_score(factors: &[RiskFactor], config: &RiskConfig) -> u8 {
    let weights = &config.weights;
    let weighted: Decimal = factors
        .iter()
        .map(|f| {
            let weight = match f.name.as_str() {
                factor::COLLATERAL_HEALTH => weights.collateral_health,
                factor::MARKET_VOLATILITY => weights.market_volatility,
                factor::WALLET_HISTORY => weights.wallet_history,
                factor::NETWORK_ACTIVITY => weights.network_activity,
                _ => Decimal::ZERO,
            };
            f.score * weight
        })
        .sum();

    let total = weights.total();
    if total <= Decimal::ZERO {
        return 0;
    }

    (weighted / total)
        .max(Decimal::ZERO)
        .min(Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u8()
        .unwrap_or(0)
}

fn recommendations(coverage_ratio: Decimal, factors: &[RiskFactor], config: &RiskConfig) -> Vec<String> {
    let impact_of = |name: &str| {
        factors
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.impact)
            .unwrap_or(Impact::Neutral)
    };
    let mut out = Vec::new();

    if coverage_ratio < config.low_risk_coverage {
        let increase = config
            .low_risk_coverage
            .checked_div(coverage_ratio)
            .and_then(|factor| (factor - Decimal::ONE).checked_mul(Decimal::ONE_HUNDRED));
        out.push(match increase {
            Some(pct) => format!(
                "Consider increasing collateral by {}% to improve loan terms",
                pct.round_dp_with_strategy(0, RoundingStrategy::AwayFromZero)
            ),
            None => "Consider increasing collateral substantially to improve loan terms".to_string(),
        });
    }

    if impact_of(factor::MARKET_VOLATILITY) == Impact::Negative {
        out.push("Current market volatility suggests conservative borrowing".to_string());
    }

    match impact_of(factor::WALLET_HISTORY) {
        Impact::Positive => {
            out.push("Your transaction history shows consistent repayment patterns".to_string())
        }
        Impact::Negative => out.push(
            "Past liquidations weigh on your terms; on-time repayments will improve them"
                .to_string(),
        ),
        Impact::Neutral => {}
    }

    if impact_of(factor::NETWORK_ACTIVITY) == Impact::Negative {
        out.push("Limited recent network activity leaves little history to assess".to_string());
    }

    if out.is_empty() {
        out.push("Your position is well collateralized; current terms are favorable".to_string());
    }

    out
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AssessmentKey {
    collateral_value: Decimal,
    requested_value: Decimal,
    signals: BorrowerSignals,
}

/// Default number of assessments kept by [`RiskEngine`]
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Risk Engine - memoizing front for [`assess`]
///
/// Assessments are cached against the exact inputs, so a repeated request
/// returns the identical result without recomputation. The cache holds at
/// most `cache_capacity` entries; inserting into a full cache drops the
/// current contents first.
pub struct RiskEngine {
    config: RiskConfig,
    cache: Mutex<HashMap<AssessmentKey, RiskAssessment>>,
    cache_capacity: usize,
}

impl RiskEngine {
    /// Create an engine, validating the configuration
    pub fn new(config: RiskConfig) -> Result<Self, RiskError> {
        config.validate()?;
        Ok(Self {
            config,
            cache: Mutex::new(HashMap::new()),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        })
    }

    /// Cap the memo cache; zero disables caching
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn assess(
        &self,
        collateral_value: Decimal,
        requested_value: Decimal,
        signals: &BorrowerSignals,
    ) -> Result<RiskAssessment, RiskError> {
        let key = AssessmentKey {
            collateral_value,
            requested_value,
            signals: signals.clone(),
        };

        if let Some(hit) = self.lock_cache().get(&key) {
            debug!(%collateral_value, %requested_value, "risk assessment cache hit");
            return Ok(hit.clone());
        }

        let assessment = assess(&self.config, collateral_value, requested_value, signals)?;
        debug!(
            %collateral_value,
            %requested_value,
            score = assessment.risk_score,
            level = %assessment.risk_level,
            "risk assessed"
        );
        if self.cache_capacity > 0 {
            let mut cache = self.lock_cache();
            if cache.len() >= self.cache_capacity {
                debug!(entries = cache.len(), "risk assessment cache full, cleared");
                cache.clear();
            }
            cache.insert(key, assessment.clone());
        }
        Ok(assessment)
    }

    pub fn cached_assessments(&self) -> usize {
        self.lock_cache().len()
    }

    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<AssessmentKey, RiskAssessment>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self {
            config: RiskConfig::default(),
            cache: Mutex::new(HashMap::new()),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}
