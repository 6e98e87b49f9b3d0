//! Asset - Type-safe asset codes
//!
//! Collateral is posted in a BTC-denominated asset and loans are paid out in
//! stablecoins or ICP. Codes are matched case-insensitively; unknown tokens
//! fall back to the `Other` variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing asset codes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Empty asset code")]
    EmptyCode,

    #[error("Asset code too long (max 10 chars): {0}")]
    TooLong(String),

    #[error("Invalid asset code format: {0}")]
    InvalidFormat(String),
}

/// Asset codes
///
/// # Examples
/// ```
/// use bitloan_core::Asset;
///
/// let collateral: Asset = "ckbtc".parse().unwrap();
/// assert_eq!(collateral, Asset::CkBtc);
/// assert_eq!(collateral.to_string(), "ckBTC");
///
/// let custom: Asset = "MYTOKEN".parse().unwrap();
/// assert!(matches!(custom, Asset::Other(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Asset {
    // === Collateral ===
    /// Chain-key Bitcoin
    CkBtc,
    /// Bitcoin
    Btc,

    // === Borrowable ===
    /// USD Coin
    Usdc,
    /// Chain-key Tether
    CkUsdt,
    /// Tether USD
    Usdt,
    /// Internet Computer
    Icp,

    // === Reference currency ===
    /// US Dollar
    Usd,

    /// Any other token
    Other(String),
}

impl Asset {
    /// Returns the asset code as a string slice
    pub fn code(&self) -> &str {
        match self {
            Asset::CkBtc => "ckBTC",
            Asset::Btc => "BTC",
            Asset::Usdc => "USDC",
            Asset::CkUsdt => "ckUSDT",
            Asset::Usdt => "USDT",
            Asset::Icp => "ICP",
            Asset::Usd => "USD",
            Asset::Other(s) => s.as_str(),
        }
    }

    /// Returns true for USD-pegged tokens
    pub fn is_stablecoin(&self) -> bool {
        matches!(self, Asset::Usdc | Asset::CkUsdt | Asset::Usdt)
    }

    /// Returns true for the reference currency prices are quoted in
    pub fn is_reference(&self) -> bool {
        matches!(self, Asset::Usd)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();

        if s.is_empty() {
            return Err(AssetError::EmptyCode);
        }

        if s.len() > 10 {
            return Err(AssetError::TooLong(s));
        }

        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AssetError::InvalidFormat(s));
        }

        Ok(match s.as_str() {
            "CKBTC" => Asset::CkBtc,
            "BTC" => Asset::Btc,
            "USDC" => Asset::Usdc,
            "CKUSDT" => Asset::CkUsdt,
            "USDT" => Asset::Usdt,
            "ICP" => Asset::Icp,
            "USD" => Asset::Usd,
            _ => Asset::Other(s),
        })
    }
}

impl TryFrom<String> for Asset {
    type Error = AssetError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Asset> for String {
    fn from(a: Asset) -> Self {
        a.code().to_string()
    }
}
