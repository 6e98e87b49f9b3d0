//! BitLoan Events - JSONL event store
//!
//! This crate handles persistence of loan events to JSONL files.
//! The journal is the source of truth: the collateral ledger and loan
//! registry are rebuilt from it on startup.

pub mod error;
pub mod reader;
pub mod record;
pub mod store;

pub use error::EventError;
pub use reader::EventReader;
pub use record::RecordedEvent;
pub use store::EventStore;
