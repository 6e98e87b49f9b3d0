//! BitLoan Lending - Collateral, loans and liquidation
//!
//! This crate owns the mutable state of the system:
//! - [`ledger::CollateralLedger`] - available and locked collateral per owner
//! - [`registry::LoanRegistry`] - loan records and the loan state machine
//! - [`monitor::LiquidationMonitor`] - price-driven liquidation checks
//!
//! State is rebuilt on startup by replaying [`event::LoanEvent`]s through
//! [`registry::LoanRegistry::apply`].

pub mod config;
pub mod error;
pub mod event;
pub mod interest;
pub mod ledger;
pub mod loan;
pub mod monitor;
pub mod registry;

pub use config::LendingConfig;
pub use error::LendingError;
pub use event::LoanEvent;
pub use interest::InterestCalculator;
pub use ledger::{CollateralAccount, CollateralLedger};
pub use loan::{Loan, LoanStatus};
pub use monitor::{LiquidationEvent, LiquidationKind, LiquidationMonitor};
pub use registry::{LoanRegistry, OriginationRequest};
