//! JSONL event store - append-only writer

use crate::error::EventError;
use crate::reader::EventReader;
use crate::record::RecordedEvent;
use chrono::{NaiveDate, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only JSONL event store
///
/// One file per UTC day (`YYYY-MM-DD.jsonl`, chosen by the record's own
/// timestamp); each line is a [`RecordedEvent`]. The store remembers the last
/// sequence on disk and only accepts the record that directly follows it.
pub struct EventStore {
    base_path: PathBuf,
    writer: Option<(NaiveDate, BufWriter<File>)>,
    last_sequence: u64,
}

impl EventStore {
    /// Open the store at `base_path`, resuming after the last journaled
    /// sequence
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, EventError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        let last_sequence = EventReader::from_directory(&base_path)?
            .last_sequence()?
            .unwrap_or(0);

        Ok(Self {
            base_path,
            writer: None,
            last_sequence,
        })
    }

    /// Sequence of the last record written
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Sequence the next record must carry
    pub fn next_sequence(&self) -> u64 {
        self.last_sequence + 1
    }

    /// Append a record and flush it to disk
    ///
    /// Fails with [`EventError::SequenceGap`] without writing anything unless
    /// `record.sequence` is exactly [`next_sequence`](Self::next_sequence).
    pub fn append(&mut self, record: &RecordedEvent) -> Result<(), EventError> {
        let expected = self.next_sequence();
        if record.sequence != expected {
            return Err(EventError::SequenceGap {
                expected,
                found: record.sequence,
            });
        }

        let line = serde_json::to_string(record)?;
        let writer = self.writer_for(record.timestamp.date_naive())?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        self.last_sequence = record.sequence;

        debug!(sequence = record.sequence, kind = record.event.kind(), "event appended");
        Ok(())
    }

    /// Writer for `date`'s file, rotating away from the previous day's
    fn writer_for(&mut self, date: NaiveDate) -> Result<&mut BufWriter<File>, EventError> {
        let stale = !matches!(&self.writer, Some((current, _)) if *current == date);
        if stale {
            self.close()?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.file_path(date))?;
            self.writer = Some((date, BufWriter::new(file)));
        }
        match &mut self.writer {
            Some((_, writer)) => Ok(writer),
            None => Err(EventError::Io(std::io::Error::other("journal file not open"))),
        }
    }

    fn file_path(&self, date: NaiveDate) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", date.format("%Y-%m-%d")))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of today's file
    pub fn today_file_path(&self) -> PathBuf {
        self.file_path(Utc::now().date_naive())
    }

    /// All JSONL files in the store, oldest first
    pub fn list_files(&self) -> Result<Vec<PathBuf>, EventError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<(), EventError> {
        if let Some((_, mut writer)) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for EventStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
