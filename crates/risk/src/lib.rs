//! BitLoan Risk Engine - Personalized loan terms
//!
//! Turns a (collateral value, requested value, borrower signals) triple into
//! binding loan terms. The assessment is a pure function of its inputs: the
//! same inputs always produce the same `RiskAssessment`.
//!
//! ## Key Components
//!
//! - [`config::RiskConfig`] - Tier cut-offs, floors, LTV and factor weights
//! - [`signals::BorrowerSignals`] - Auditable history and market inputs
//! - [`factor`] - The four named sub-scores and their formulas
//! - [`engine::RiskEngine`] - Memoizing front for [`engine::assess`]

pub mod assessment;
pub mod config;
pub mod engine;
pub mod error;
pub mod factor;
pub mod signals;

pub use assessment::{RiskAssessment, RiskLevel};
pub use config::{FactorWeights, RiskConfig};
pub use engine::{assess, RiskEngine};
pub use error::RiskError;
pub use factor::{Impact, RiskFactor};
pub use signals::{BorrowerSignals, SignalsProvider, StaticSignals};
