//! Core oracle types

use async_trait::async_trait;
use bitloan_core::Asset;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OracleError, PriceSnapshot};

/// A price quote for one unit of an asset, in the reference currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub asset: Asset,
    /// Reference-currency value of one unit
    pub value: Decimal,
    /// Timestamp when this price was fetched
    pub timestamp: DateTime<Utc>,
    /// Source of the price (e.g., "mock", "xrc", "coingecko")
    pub source: String,
}

impl Price {
    pub fn new(asset: Asset, value: Decimal, source: impl Into<String>) -> Self {
        Self {
            asset,
            value,
            timestamp: Utc::now(),
            source: source.into(),
        }
    }

    /// Check if price is stale (older than threshold)
    pub fn is_stale(&self, max_age_secs: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.timestamp);
        age.num_seconds() > max_age_secs as i64
    }

    /// Reject quotes that cannot be used in ratio calculations
    pub fn validate(&self) -> Result<(), OracleError> {
        if self.value <= Decimal::ZERO {
            return Err(OracleError::InvalidPrice {
                asset: self.asset.to_string(),
                reason: format!("price must be positive, got {}", self.value),
            });
        }
        Ok(())
    }
}

/// Price Oracle trait - the port through which prices enter the system
///
/// Implementations can be:
/// - MockOracle: For testing and the CLI with fixed prices
/// - An exchange-rate canister or HTTP feed adapter
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Get the current price for an asset
    async fn get_price(&self, asset: &Asset) -> Result<Price, OracleError>;

    /// Get a list of all assets with a quote
    async fn supported_assets(&self) -> Vec<Asset>;

    /// Resolve a consistent snapshot for several assets at once.
    ///
    /// Fails on the first missing, invalid or stale quote so a partial
    /// snapshot never reaches liquidation checks.
    async fn snapshot(
        &self,
        assets: &[Asset],
        max_age_secs: u64,
    ) -> Result<PriceSnapshot, OracleError> {
        let mut snapshot = PriceSnapshot::new();
        for asset in assets {
            let price = self.get_price(asset).await?;
            price.validate()?;
            if price.is_stale(max_age_secs) {
                return Err(OracleError::StalePrice {
                    asset: asset.to_string(),
                    last_update: price.timestamp.to_rfc3339(),
                    threshold_secs: max_age_secs,
                });
            }
            snapshot.insert(price.asset, price.value);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fresh_price_is_not_stale() {
        let price = Price::new(Asset::CkBtc, dec!(45000), "mock");
        assert!(!price.is_stale(60));
    }

    #[test]
    fn test_old_price_is_stale() {
        let mut price = Price::new(Asset::CkBtc, dec!(45000), "mock");
        price.timestamp = Utc::now() - chrono::Duration::seconds(120);
        assert!(price.is_stale(60));
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        let price = Price::new(Asset::Icp, Decimal::ZERO, "mock");
        assert!(matches!(
            price.validate(),
            Err(OracleError::InvalidPrice { .. })
        ));
    }
}
