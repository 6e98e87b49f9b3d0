//! BitLoan RPC - API/CLI orchestrator
//!
//! This crate provides the boundary API ([`AppContext`]) and the `bitloan`
//! CLI binary.

pub mod commands;
pub mod config;
pub mod context;
pub mod error;

pub use config::AppConfig;
pub use context::{AppContext, Quote};
pub use error::AppError;
