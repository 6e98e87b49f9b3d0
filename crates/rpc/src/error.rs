//! Boundary errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Risk error: {0}")]
    Risk(#[from] bitloan_risk::RiskError),

    #[error("Lending error: {0}")]
    Lending(#[from] bitloan_lending::LendingError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] bitloan_oracle::OracleError),

    #[error("Event store error: {0}")]
    Event(#[from] bitloan_events::EventError),

    #[error("Event bus error: {0}")]
    Bus(#[from] bitloan_bus::BusError),

    #[error("Journal replay failed at sequence {sequence}: {source}")]
    Replay {
        sequence: u64,
        #[source]
        source: bitloan_lending::LendingError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
