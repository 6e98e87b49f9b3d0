//! In-process event bus
//!
//! Committed events go to two kinds of consumers:
//! - registered [`EventSubscriber`]s, awaited in registration order
//! - broadcast receivers from [`EventBus::subscribe`], for fire-and-forget
//!   listeners

use bitloan_events::{EventReader, RecordedEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::BusError;
use crate::event::BusEvent;
use crate::subscriber::EventSubscriber;

const DEFAULT_CAPACITY: usize = 1024;

/// Receiver type for bus events
pub type BusReceiver = broadcast::Receiver<Arc<BusEvent>>;

/// Event bus for distributing committed events
pub struct EventBus {
    journal_path: PathBuf,
    tx: broadcast::Sender<Arc<BusEvent>>,
    subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl EventBus {
    /// Create a new event bus over the journal at `journal_path`
    pub fn new(journal_path: impl AsRef<Path>) -> Self {
        Self::with_capacity(journal_path, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(journal_path: impl AsRef<Path>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            journal_path: journal_path.as_ref().to_path_buf(),
            tx,
            subscribers: Vec::new(),
        }
    }

    /// Register a subscriber
    pub fn register(&mut self, subscriber: Arc<dyn EventSubscriber>) {
        debug!(name = subscriber.name(), "subscriber registered");
        self.subscribers.push(subscriber);
    }

    /// Open a broadcast receiver
    pub fn subscribe(&self) -> BusReceiver {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Publish a committed record to every consumer
    ///
    /// A failing subscriber is logged and does not stop delivery to the
    /// others; the first failure is returned after all have run.
    pub async fn publish(&self, record: RecordedEvent) -> Result<(), BusError> {
        self.dispatch(BusEvent::committed(record)).await
    }

    /// Feed the whole journal to the registered subscribers
    pub async fn replay(&self) -> Result<usize, BusError> {
        let records = self.reader()?.read_all()?;
        let from_sequence = records.first().map_or(0, |r| r.sequence);

        for subscriber in &self.subscribers {
            subscriber.on_replay_start().await?;
        }
        self.dispatch(BusEvent::replay_started(from_sequence)).await?;

        let mut count = 0;
        for record in records {
            let skip = !self.subscribers.is_empty()
                && self
                    .subscribers
                    .iter()
                    .all(|s| s.last_processed_sequence().map_or(false, |seq| seq >= record.sequence));
            if skip {
                continue;
            }
            self.dispatch(BusEvent::committed(record)).await?;
            count += 1;
        }

        self.dispatch(BusEvent::replay_completed(count)).await?;
        for subscriber in &self.subscribers {
            subscriber.on_replay_complete().await?;
        }

        Ok(count)
    }

    async fn dispatch(&self, event: BusEvent) -> Result<(), BusError> {
        let event = Arc::new(event);

        // send() only fails when nobody is listening
        if self.tx.send(Arc::clone(&event)).is_err() {
            debug!("bus event dropped (no receivers)");
        }

        let mut first_error = None;
        for subscriber in &self.subscribers {
            if let Err(e) = subscriber.handle(&event).await {
                warn!(name = subscriber.name(), error = %e, "subscriber failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Get an event reader for replay
    pub fn reader(&self) -> Result<EventReader, bitloan_events::EventError> {
        EventReader::from_directory(&self.journal_path)
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }
}
