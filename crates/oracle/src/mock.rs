//! Mock Oracle for testing and the CLI
//!
//! Provides configurable fixed prices for risk and liquidation calculations.

use async_trait::async_trait;
use bitloan_core::Asset;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::OracleError;
use crate::types::{Price, PriceOracle};

/// Mock Price Oracle
///
/// Stores fixed prices that can be updated programmatically.
pub struct MockOracle {
    prices: RwLock<HashMap<Asset, Price>>,
}

impl MockOracle {
    /// Create a new empty mock oracle
    pub fn new() -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
        }
    }

    /// Create a mock oracle quoting the collateral and every borrowable token
    pub fn with_defaults() -> Self {
        let oracle = Self::new();

        oracle.set_price(Asset::CkBtc, Decimal::from(45_000));
        oracle.set_price(Asset::Btc, Decimal::from(45_000));
        oracle.set_price(Asset::Usdc, Decimal::ONE);
        oracle.set_price(Asset::CkUsdt, Decimal::ONE);
        oracle.set_price(Asset::Usdt, Decimal::ONE);
        oracle.set_price(Asset::Icp, Decimal::new(125, 1));

        oracle
    }

    /// Set a fixed price for an asset
    pub fn set_price(&self, asset: Asset, value: Decimal) {
        let price = Price::new(asset.clone(), value, "mock");
        let mut prices = self.prices.write().unwrap_or_else(|e| e.into_inner());
        prices.insert(asset, price);
    }

    /// Remove a price (for testing the not-found path)
    pub fn remove_price(&self, asset: &Asset) {
        let mut prices = self.prices.write().unwrap_or_else(|e| e.into_inner());
        prices.remove(asset);
    }

    pub fn asset_count(&self) -> usize {
        self.prices.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl PriceOracle for MockOracle {
    async fn get_price(&self, asset: &Asset) -> Result<Price, OracleError> {
        if asset.is_reference() {
            return Ok(Price::new(asset.clone(), Decimal::ONE, "reference"));
        }
        let prices = self.prices.read().unwrap_or_else(|e| e.into_inner());
        prices
            .get(asset)
            .cloned()
            .ok_or_else(|| OracleError::PriceNotFound {
                asset: asset.to_string(),
            })
    }

    async fn supported_assets(&self) -> Vec<Asset> {
        let prices = self.prices.read().unwrap_or_else(|e| e.into_inner());
        prices.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_oracle_default_prices() {
        let oracle = MockOracle::with_defaults();

        let btc = oracle.get_price(&Asset::CkBtc).await.unwrap();
        assert_eq!(btc.value, dec!(45000));

        let icp = oracle.get_price(&Asset::Icp).await.unwrap();
        assert_eq!(icp.value, dec!(12.5));
    }

    #[tokio::test]
    async fn test_mock_oracle_set_price() {
        let oracle = MockOracle::new();
        assert!(oracle.get_price(&Asset::CkBtc).await.is_err());

        oracle.set_price(Asset::CkBtc, dec!(34500));

        let price = oracle.get_price(&Asset::CkBtc).await.unwrap();
        assert_eq!(price.value, dec!(34500));
    }

    #[tokio::test]
    async fn test_mock_oracle_price_not_found() {
        let oracle = MockOracle::with_defaults();
        oracle.remove_price(&Asset::Icp);

        let result = oracle.get_price(&Asset::Icp).await;
        assert!(matches!(result, Err(OracleError::PriceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_reference_currency_always_quoted() {
        let oracle = MockOracle::new();
        let usd = oracle.get_price(&Asset::Usd).await.unwrap();
        assert_eq!(usd.value, Decimal::ONE);
    }

    #[tokio::test]
    async fn test_snapshot_collects_requested_assets() {
        let oracle = MockOracle::with_defaults();
        let snapshot = oracle
            .snapshot(&[Asset::CkBtc, Asset::Usdc], 60)
            .await
            .unwrap();

        assert_eq!(snapshot.price_of(&Asset::CkBtc), Some(dec!(45000)));
        assert_eq!(snapshot.price_of(&Asset::Usdc), Some(Decimal::ONE));
        assert_eq!(snapshot.price_of(&Asset::Icp), None);
    }

    #[tokio::test]
    async fn test_snapshot_rejects_invalid_price() {
        let oracle = MockOracle::new();
        oracle.set_price(Asset::CkBtc, Decimal::ZERO);

        let result = oracle.snapshot(&[Asset::CkBtc], 60).await;
        assert!(matches!(result, Err(OracleError::InvalidPrice { .. })));
    }

    #[tokio::test]
    async fn test_supported_assets() {
        let oracle = MockOracle::with_defaults();
        let assets = oracle.supported_assets().await;
        assert_eq!(assets.len(), oracle.asset_count());
        assert!(assets.contains(&Asset::CkBtc));
    }
}
