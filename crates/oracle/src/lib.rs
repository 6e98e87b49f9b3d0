//! BitLoan Price Oracle
//!
//! Prices are quoted per unit of asset in the reference currency (USD).
//! The core never fetches prices itself: callers resolve a `PriceSnapshot`
//! through a `PriceOracle` and hand it to the risk and liquidation logic.

mod error;
mod mock;
mod snapshot;
mod types;

pub use error::OracleError;
pub use mock::MockOracle;
pub use snapshot::PriceSnapshot;
pub use types::{Price, PriceOracle};
