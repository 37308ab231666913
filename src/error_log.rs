use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One failure event as shown on the error surface and written to `error.log`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogEntry {
    pub timestamp: String,
    pub message: String,
    pub stack_or_detail: String,
}

impl ErrorLogEntry {
    pub fn now(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message: message.into(),
            stack_or_detail: detail.into(),
        }
    }

    /// `[<timestamp>] <message>\n<detail>\n\n`
    pub fn to_log_block(&self) -> String {
        format!(
            "[{}] {}\n{}\n\n",
            self.timestamp, self.message, self.stack_or_detail
        )
    }
}

pub fn append_entry_to_file(log_file: &Path, entry: &ErrorLogEntry) -> io::Result<()> {
    if let Some(parent_dir) = log_file.parent() {
        fs::create_dir_all(parent_dir)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;
    file.write_all(entry.to_log_block().as_bytes())
}

/// In-memory half of the error log. Entries are only ever appended, and only by
/// the coordinating task; workers write the file half.
#[derive(Debug)]
pub struct ErrorLogStore {
    entries: Vec<ErrorLogEntry>,
    log_file: PathBuf,
}

impl ErrorLogStore {
    pub fn new(log_file: PathBuf) -> Self {
        Self {
            entries: Vec::new(),
            log_file,
        }
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn record(&mut self, entry: ErrorLogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ErrorLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
