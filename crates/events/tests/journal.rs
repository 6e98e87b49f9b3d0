//! Journal round-trip tests

use bitloan_core::{Amount, OwnerId};
use bitloan_events::{EventError, EventReader, EventStore, RecordedEvent};
use bitloan_lending::LoanEvent;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use std::io::Write;
use tempfile::TempDir;

fn deposit(owner: &str, sequence: u64) -> RecordedEvent {
    RecordedEvent::new(
        sequence,
        LoanEvent::CollateralDeposited {
            owner: OwnerId::new(owner).unwrap(),
            amount: Amount::new(dec!(0.5)).unwrap(),
            at: Utc::now(),
        },
    )
}

#[test]
fn test_append_then_read() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = EventStore::new(temp_dir.path()).unwrap();

    let records: Vec<_> = (1..=3).map(|seq| deposit("alice", seq)).collect();
    for record in &records {
        store.append(record).unwrap();
    }

    let reader = EventReader::from_directory(temp_dir.path()).unwrap();
    assert_eq!(reader.read_all().unwrap(), records);
    assert_eq!(reader.last_sequence().unwrap(), Some(3));
    assert_eq!(reader.count().unwrap(), 3);
    assert!(store.today_file_path().exists());
}

#[test]
fn test_missing_directory_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let reader = EventReader::from_directory(temp_dir.path().join("nope")).unwrap();

    assert!(reader.read_all().unwrap().is_empty());
    assert_eq!(reader.last_sequence().unwrap(), None);
}

#[test]
fn test_rotates_by_record_date() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = EventStore::new(temp_dir.path()).unwrap();

    let mut yesterday = deposit("alice", 1);
    yesterday.timestamp = Utc::now() - Duration::days(1);
    store.append(&yesterday).unwrap();
    store.append(&deposit("alice", 2)).unwrap();

    assert_eq!(store.list_files().unwrap().len(), 2);
    let reader = EventReader::from_directory(temp_dir.path()).unwrap();
    let sequences: Vec<_> = reader.read_all().unwrap().iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![1, 2]);
}

#[test]
fn test_reopen_appends() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut store = EventStore::new(temp_dir.path()).unwrap();
        store.append(&deposit("alice", 1)).unwrap();
    }
    {
        let mut store = EventStore::new(temp_dir.path()).unwrap();
        store.append(&deposit("bob", 2)).unwrap();
    }

    let records = EventReader::from_directory(temp_dir.path())
        .unwrap()
        .read_all()
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].event.owner().as_str(), "bob");
}

#[test]
fn test_append_rejects_out_of_order_sequence() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = EventStore::new(temp_dir.path()).unwrap();
    assert_eq!(store.next_sequence(), 1);
    store.append(&deposit("alice", 1)).unwrap();

    assert!(matches!(
        store.append(&deposit("alice", 3)),
        Err(EventError::SequenceGap { expected: 2, found: 3 })
    ));
    assert!(matches!(
        store.append(&deposit("alice", 1)),
        Err(EventError::SequenceGap { expected: 2, found: 1 })
    ));
    assert_eq!(store.last_sequence(), 1);

    store.append(&deposit("alice", 2)).unwrap();
    let reader = EventReader::from_directory(temp_dir.path()).unwrap();
    assert_eq!(reader.count().unwrap(), 2);
}

#[test]
fn test_reopen_resumes_sequence() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut store = EventStore::new(temp_dir.path()).unwrap();
        for seq in 1..=3 {
            store.append(&deposit("alice", seq)).unwrap();
        }
    }

    let mut store = EventStore::new(temp_dir.path()).unwrap();
    assert_eq!(store.last_sequence(), 3);
    assert!(store.append(&deposit("bob", 1)).is_err());
    store.append(&deposit("bob", 4)).unwrap();
}

#[test]
fn test_sequence_gap_detected() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = EventStore::new(temp_dir.path()).unwrap();
    store.append(&deposit("alice", 1)).unwrap();
    store.close().unwrap();

    // A gap can only come from outside the store
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(store.today_file_path())
        .unwrap();
    writeln!(file, "{}", serde_json::to_string(&deposit("alice", 3)).unwrap()).unwrap();

    let result = EventReader::from_directory(temp_dir.path()).unwrap().read_all();
    assert!(matches!(
        result,
        Err(EventError::SequenceGap { expected: 2, found: 3 })
    ));
}

#[test]
fn test_corrupt_line_reports_location() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = EventStore::new(temp_dir.path()).unwrap();
    store.append(&deposit("alice", 1)).unwrap();
    store.close().unwrap();

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(store.today_file_path())
        .unwrap();
    writeln!(file, "{{not json").unwrap();

    let result = EventReader::from_directory(temp_dir.path()).unwrap().read_all();
    assert!(matches!(result, Err(EventError::InvalidFile { line: 2, .. })));
}
