//! JSONL event reader - sequential reader for replay

use crate::error::EventError;
use crate::record::RecordedEvent;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Sequential event reader for replay
pub struct EventReader {
    files: Vec<PathBuf>,
}

impl EventReader {
    /// Create a new reader from a directory
    ///
    /// A missing directory reads as an empty journal.
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let path = path.as_ref();
        let mut files = Vec::new();

        if path.exists() {
            for entry in std::fs::read_dir(path)? {
                let entry = entry?;
                let file_path = entry.path();
                if file_path.extension().map_or(false, |ext| ext == "jsonl") {
                    files.push(file_path);
                }
            }
        }

        files.sort();

        Ok(Self { files })
    }

    /// Read all records from all files in order
    ///
    /// Fails if the sequence numbers are not gapless from 1.
    pub fn read_all(&self) -> Result<Vec<RecordedEvent>, EventError> {
        let mut records: Vec<RecordedEvent> = Vec::new();

        for file_path in &self.files {
            for record in Self::read_file(file_path)? {
                let expected = records.last().map_or(1, |last| last.sequence + 1);
                if record.sequence != expected {
                    return Err(EventError::SequenceGap {
                        expected,
                        found: record.sequence,
                    });
                }
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Get the last sequence number from all files
    pub fn last_sequence(&self) -> Result<Option<u64>, EventError> {
        let last_file = match self.files.last() {
            Some(file) => file,
            None => return Ok(None),
        };
        Ok(Self::read_file(last_file)?.last().map(|r| r.sequence))
    }

    /// Count total records across all files
    pub fn count(&self) -> Result<usize, EventError> {
        let mut count = 0;

        for file_path in &self.files {
            let file = File::open(file_path)?;
            let reader = BufReader::new(file);

            for line in reader.lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    count += 1;
                }
            }
        }

        Ok(count)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn read_file(file_path: &Path) -> Result<Vec<RecordedEvent>, EventError> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: RecordedEvent =
                serde_json::from_str(&line).map_err(|e| EventError::InvalidFile {
                    file: file_path.display().to_string(),
                    line: index + 1,
                    reason: e.to_string(),
                })?;
            records.push(record);
        }

        Ok(records)
    }
}
