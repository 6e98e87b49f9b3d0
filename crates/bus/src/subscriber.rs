//! Event subscriber trait for async event handling

use async_trait::async_trait;
use bitloan_lending::LoanEvent;
use tracing::{info, warn};

use crate::error::BusError;
use crate::event::BusEvent;

/// Trait for event subscribers
///
/// Subscribers receive events from the event bus and process them asynchronously.
/// Each subscriber should be idempotent (handle duplicate events gracefully).
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Get the subscriber name (for logging)
    fn name(&self) -> &str;

    /// Handle a bus event
    async fn handle(&self, event: &BusEvent) -> Result<(), BusError>;

    /// Called when replay starts
    async fn on_replay_start(&self) -> Result<(), BusError> {
        Ok(())
    }

    /// Called when replay completes
    async fn on_replay_complete(&self) -> Result<(), BusError> {
        Ok(())
    }

    /// Last sequence this subscriber has already processed
    ///
    /// Replay skips records every subscriber has seen. None means the
    /// subscriber does not track sequences.
    fn last_processed_sequence(&self) -> Option<u64> {
        None
    }
}

/// Writes every committed event to the tracing log
///
/// Liquidation warnings are logged at `warn`, everything else at `info`.
#[derive(Debug, Default)]
pub struct LoggingSubscriber;

#[async_trait]
impl EventSubscriber for LoggingSubscriber {
    fn name(&self) -> &str {
        "logging"
    }

    async fn handle(&self, event: &BusEvent) -> Result<(), BusError> {
        let record = match event.record() {
            Some(record) => record,
            None => return Ok(()),
        };

        match &record.event {
            LoanEvent::LiquidationWarning {
                loan_id,
                owner,
                live_collateral_ratio,
                liquidation_threshold,
                ..
            } => warn!(
                sequence = record.sequence,
                loan_id = %loan_id,
                owner = %owner,
                live_ratio = %live_collateral_ratio,
                threshold = %liquidation_threshold,
                "liquidation warning"
            ),
            other => info!(
                sequence = record.sequence,
                kind = other.kind(),
                owner = %other.owner(),
                "event committed"
            ),
        }
        Ok(())
    }
}
