//! Event bus tests

use async_trait::async_trait;
use bitloan_bus::{BusError, BusEvent, EventBus, EventSubscriber, LoggingSubscriber};
use bitloan_core::{Amount, OwnerId};
use bitloan_events::{EventStore, RecordedEvent};
use bitloan_lending::LoanEvent;
use chrono::Utc;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn deposit(sequence: u64) -> RecordedEvent {
    RecordedEvent::new(
        sequence,
        LoanEvent::CollateralDeposited {
            owner: OwnerId::new("alice").unwrap(),
            amount: Amount::new(dec!(1)).unwrap(),
            at: Utc::now(),
        },
    )
}

#[derive(Default)]
struct Recorder {
    sequences: Mutex<Vec<u64>>,
    replay_started: AtomicBool,
    replay_completed: AtomicBool,
}

#[async_trait]
impl EventSubscriber for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn handle(&self, event: &BusEvent) -> Result<(), BusError> {
        if let Some(record) = event.record() {
            self.sequences.lock().unwrap().push(record.sequence);
        }
        Ok(())
    }

    async fn on_replay_start(&self) -> Result<(), BusError> {
        self.replay_started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn on_replay_complete(&self) -> Result<(), BusError> {
        self.replay_completed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct Failing {
    calls: AtomicUsize,
}

#[async_trait]
impl EventSubscriber for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn handle(&self, _event: &BusEvent) -> Result<(), BusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BusError::SubscriberFailed {
            name: "failing".to_string(),
            reason: "boom".to_string(),
        })
    }
}

#[tokio::test]
async fn test_publish_reaches_subscribers_and_receivers() {
    let temp_dir = TempDir::new().unwrap();
    let mut bus = EventBus::new(temp_dir.path());
    let recorder = Arc::new(Recorder::default());
    bus.register(recorder.clone());
    bus.register(Arc::new(LoggingSubscriber));
    let mut rx = bus.subscribe();

    bus.publish(deposit(1)).await.unwrap();
    bus.publish(deposit(2)).await.unwrap();

    assert_eq!(*recorder.sequences.lock().unwrap(), vec![1, 2]);
    let first = rx.recv().await.unwrap();
    assert_eq!(first.record().unwrap().sequence, 1);
    assert_eq!(bus.subscriber_count(), 2);
}

#[tokio::test]
async fn test_failing_subscriber_does_not_block_others() {
    let temp_dir = TempDir::new().unwrap();
    let mut bus = EventBus::new(temp_dir.path());
    let failing = Arc::new(Failing {
        calls: AtomicUsize::new(0),
    });
    let recorder = Arc::new(Recorder::default());
    bus.register(failing.clone());
    bus.register(recorder.clone());

    let result = bus.publish(deposit(1)).await;

    assert!(matches!(result, Err(BusError::SubscriberFailed { .. })));
    assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    assert_eq!(*recorder.sequences.lock().unwrap(), vec![1]);
}

#[tokio::test]
async fn test_replay_from_journal() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut store = EventStore::new(temp_dir.path()).unwrap();
        for seq in 1..=3 {
            store.append(&deposit(seq)).unwrap();
        }
    }

    let mut bus = EventBus::new(temp_dir.path());
    let recorder = Arc::new(Recorder::default());
    bus.register(recorder.clone());

    let count = bus.replay().await.unwrap();

    assert_eq!(count, 3);
    assert_eq!(*recorder.sequences.lock().unwrap(), vec![1, 2, 3]);
    assert!(recorder.replay_started.load(Ordering::SeqCst));
    assert!(recorder.replay_completed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_publish_without_listeners_is_ok() {
    let temp_dir = TempDir::new().unwrap();
    let bus = EventBus::new(temp_dir.path());
    assert!(bus.publish(deposit(1)).await.is_ok());
}
