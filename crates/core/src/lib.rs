//! BitLoan Core - Domain types
//!
//! This crate contains the fundamental types shared by every BitLoan crate:
//! - `Amount`: Non-negative decimal wrapper for collateral and loan amounts
//! - `Asset`: Type-safe asset codes (collateral and borrowable tokens)
//! - `OwnerId`, `LoanId`: Stable identifiers for borrowers and loans

pub mod amount;
pub mod asset;
pub mod id;

pub use amount::{Amount, AmountError};
pub use asset::{Asset, AssetError};
pub use id::{LoanId, OwnerId, OwnerIdError};
