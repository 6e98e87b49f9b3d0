//! Journal record - one line of the JSONL store

use bitloan_lending::LoanEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A loan event stamped with its position in the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// 1-based, gapless
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: LoanEvent,
}

impl RecordedEvent {
    pub fn new(sequence: u64, event: LoanEvent) -> Self {
        Self {
            sequence,
            timestamp: Utc::now(),
            event,
        }
    }
}
