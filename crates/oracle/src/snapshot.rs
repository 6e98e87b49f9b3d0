//! Point-in-time price set handed to the liquidation monitor

use bitloan_core::Asset;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prices for several assets taken at one instant.
///
/// The reference currency itself always prices at 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    prices: BTreeMap<Asset, Decimal>,
    pub taken_at: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn new() -> Self {
        Self {
            prices: BTreeMap::new(),
            taken_at: Utc::now(),
        }
    }

    /// Builder-style insert
    pub fn with_price(mut self, asset: Asset, price: Decimal) -> Self {
        self.insert(asset, price);
        self
    }

    pub fn insert(&mut self, asset: Asset, price: Decimal) {
        self.prices.insert(asset, price);
    }

    /// Price of one unit of `asset`, if quoted
    pub fn price_of(&self, asset: &Asset) -> Option<Decimal> {
        if asset.is_reference() {
            return Some(Decimal::ONE);
        }
        self.prices.get(asset).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Asset, &Decimal)> {
        self.prices.iter()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl Default for PriceSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
