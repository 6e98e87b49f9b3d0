//! Bus events for pub/sub distribution

use bitloan_events::RecordedEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events published on the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BusEvent {
    /// A loan event was appended to the journal
    Committed {
        record: RecordedEvent,
        /// When the event was published
        timestamp: DateTime<Utc>,
    },

    /// Replay has started
    ReplayStarted { from_sequence: u64 },

    /// Replay has completed
    ReplayCompleted { events_count: usize },
}

impl BusEvent {
    pub fn committed(record: RecordedEvent) -> Self {
        Self::Committed {
            record,
            timestamp: Utc::now(),
        }
    }

    pub fn replay_started(from_sequence: u64) -> Self {
        Self::ReplayStarted { from_sequence }
    }

    pub fn replay_completed(events_count: usize) -> Self {
        Self::ReplayCompleted { events_count }
    }

    /// Journal record carried by this event, if any
    pub fn record(&self) -> Option<&RecordedEvent> {
        match self {
            BusEvent::Committed { record, .. } => Some(record),
            _ => None,
        }
    }
}
