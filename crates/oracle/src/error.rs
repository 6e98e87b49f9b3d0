//! Oracle error types

use thiserror::Error;

/// Oracle-related errors
#[derive(Debug, Error)]
pub enum OracleError {
    /// No quote for the asset
    #[error("Price not found for {asset}")]
    PriceNotFound { asset: String },

    /// Price data is older than the accepted age
    #[error("Stale price for {asset}: last update was {last_update}, threshold is {threshold_secs}s")]
    StalePrice {
        asset: String,
        last_update: String,
        threshold_secs: u64,
    },

    /// Price data is invalid
    #[error("Invalid price for {asset}: {reason}")]
    InvalidPrice { asset: String, reason: String },

    /// External oracle connection failed
    #[error("Oracle connection failed: {source}")]
    ConnectionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
