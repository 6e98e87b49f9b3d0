//! Borrower signals - the auditable inputs behind the non-collateral factors

use async_trait::async_trait;
use bitloan_core::OwnerId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::RiskError;

/// History and market inputs for one borrower at one point in time.
///
/// A snapshot of these values, together with the collateral and requested
/// values, fully determines an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorrowerSignals {
    /// Days since the borrower's first recorded activity
    #[serde(default)]
    pub wallet_age_days: u32,

    /// Loans repaid in full
    #[serde(default)]
    pub repaid_loans: u32,

    /// Loans that ended in liquidation
    #[serde(default)]
    pub liquidated_loans: u32,

    /// Transactions in the trailing 30 days
    #[serde(default)]
    pub transactions_last_30_days: u32,

    /// Distinct days with activity in the trailing 30 days
    #[serde(default)]
    pub active_days_last_30_days: u32,

    /// Annualized volatility of the collateral asset, in percent
    #[serde(default = "default_market_volatility")]
    pub market_volatility: Decimal,
}

fn default_market_volatility() -> Decimal {
    Decimal::from(25)
}

impl Default for BorrowerSignals {
    /// A borrower with no history under normal market conditions
    fn default() -> Self {
        Self {
            wallet_age_days: 0,
            repaid_loans: 0,
            liquidated_loans: 0,
            transactions_last_30_days: 0,
            active_days_last_30_days: 0,
            market_volatility: default_market_volatility(),
        }
    }
}

/// Source of borrower signals
///
/// Implementations can be:
/// - StaticSignals: Fixed per-owner signals (tests, CLI)
/// - An indexer adapter reading on-chain history
#[async_trait]
pub trait SignalsProvider: Send + Sync {
    async fn get_signals(&self, owner: &OwnerId) -> Result<BorrowerSignals, RiskError>;
}

/// In-memory signals provider
///
/// Owners without an explicit entry receive the fallback signals.
pub struct StaticSignals {
    signals: RwLock<HashMap<OwnerId, BorrowerSignals>>,
    fallback: BorrowerSignals,
}

impl StaticSignals {
    pub fn new() -> Self {
        Self::with_fallback(BorrowerSignals::default())
    }

    pub fn with_fallback(fallback: BorrowerSignals) -> Self {
        Self {
            signals: RwLock::new(HashMap::new()),
            fallback,
        }
    }

    pub fn set_signals(&self, owner: OwnerId, signals: BorrowerSignals) {
        let mut map = self.signals.write().unwrap_or_else(|e| e.into_inner());
        map.insert(owner, signals);
    }
}

impl Default for StaticSignals {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalsProvider for StaticSignals {
    async fn get_signals(&self, owner: &OwnerId) -> Result<BorrowerSignals, RiskError> {
        let map = self.signals.read().unwrap_or_else(|e| e.into_inner());
        Ok(map.get(owner).cloned().unwrap_or_else(|| self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_signals_partial_json() {
        let json = r#"{ "repaid_loans": 2 }"#;
        let signals: BorrowerSignals = serde_json::from_str(json).unwrap();

        assert_eq!(signals.repaid_loans, 2);
        assert_eq!(signals.wallet_age_days, 0);
        assert_eq!(signals.market_volatility, Decimal::from(25));
    }

    #[tokio::test]
    async fn test_static_signals_fallback() {
        let provider = StaticSignals::new();
        let alice = OwnerId::new("alice").unwrap();

        let signals = provider.get_signals(&alice).await.unwrap();
        assert_eq!(signals, BorrowerSignals::default());
    }

    #[tokio::test]
    async fn test_static_signals_per_owner() {
        let provider = StaticSignals::new();
        let alice = OwnerId::new("alice").unwrap();
        let seasoned = BorrowerSignals {
            wallet_age_days: 400,
            repaid_loans: 3,
            ..BorrowerSignals::default()
        };
        provider.set_signals(alice.clone(), seasoned.clone());

        assert_eq!(provider.get_signals(&alice).await.unwrap(), seasoned);
    }
}
