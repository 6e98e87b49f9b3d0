//! BitLoan Event Bus - In-process async event distribution
//!
//! Distributes committed loan events (including liquidation warnings) to
//! subscribers.
//!
//! - Async pub/sub with a tokio broadcast channel
//! - EventSubscriber trait for custom handlers
//! - Replay from JSONL (source of truth)
//! - No retention in the bus; events live only in the journal

pub mod channel;
pub mod error;
pub mod event;
pub mod subscriber;

pub use channel::EventBus;
pub use error::BusError;
pub use event::BusEvent;
pub use subscriber::{EventSubscriber, LoggingSubscriber};
