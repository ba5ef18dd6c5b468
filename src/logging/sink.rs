//! # Log Sinks
//!
//! Destinations for formatted log records. The logger holds one sink for files
//! and one for the console, both behind the [`LogSink`] trait so tests can swap
//! in a [`MemorySink`].
//!
//! ## Sinks
//!
//! - **FileSink**: one append-only file per category under a log directory
//! - **ConsoleSink**: stdout, prefix colored by level
//! - **MemorySink**: in-memory capture for tests and embedding

use super::rotation::backup_path;
use super::types::{LogCategory, LogLevel, LogRecord};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

///////////////////////////////////////////////////////////////////////////////
//****                         Public Traits                             ****//
///////////////////////////////////////////////////////////////////////////////

/// A destination for log records
pub trait LogSink: Send + Sync {
    /// Write one record as exactly one line
    fn write(&self, record: &LogRecord) -> io::Result<()>;

    /// Rename every backing file larger than `max_bytes`, returning the backup paths.
    /// Sinks without files have nothing to rotate.
    fn rotate(&self, _max_bytes: u64) -> Vec<PathBuf> {
        Vec::new()
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Append-only file per category
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Create the sink, creating the log directory if it does not exist yet
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing a category
    pub fn path_for(&self, category: LogCategory) -> PathBuf {
        self.dir.join(category.file_name())
    }

    fn append_line(path: &Path, line: &str) -> io::Result<()> {
        // One write_all on an O_APPEND handle keeps concurrent lines whole
        let mut entry = String::with_capacity(line.len() + 1);
        entry.push_str(line);
        entry.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(entry.as_bytes())
    }
}

impl LogSink for FileSink {
    fn write(&self, record: &LogRecord) -> io::Result<()> {
        Self::append_line(&self.path_for(record.category), &record.to_line())
    }

    fn rotate(&self, max_bytes: u64) -> Vec<PathBuf> {
        let mut rotated = Vec::new();

        for category in LogCategory::ALL {
            let path = self.path_for(category);

            let size = match fs::metadata(&path) {
                Ok(meta) => meta.len(),
                Err(e) => {
                    debug!("Skipping rotation of {}: {}", path.display(), e);
                    continue;
                }
            };
            if size <= max_bytes {
                continue;
            }

            let backup = backup_path(&path, &super::types::timestamp_now());
            if let Err(e) = fs::rename(&path, &backup) {
                debug!("Failed to rotate {}: {}", path.display(), e);
                continue;
            }

            info!(
                "Rotated {} ({} bytes) to {}",
                path.display(),
                size,
                backup.display()
            );

            let marker = LogRecord::new(category, LogLevel::Info, "Log rotated");
            if let Err(e) = self.write(&marker) {
                debug!("Failed to write rotation marker to {}: {}", path.display(), e);
            }

            rotated.push(backup);
        }

        rotated
    }
}

/// Stdout sink with ANSI colored prefixes
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    color: bool,
}

impl ConsoleSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LogSink for ConsoleSink {
    fn write(&self, record: &LogRecord) -> io::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", record.to_console_line(self.color))
    }
}

/// Captures records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record written so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Messages of the records written so far
    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    /// Records whose message starts with `prefix`
    pub fn matching(&self, prefix: &str) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.message.starts_with(prefix))
            .collect()
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl LogSink for MemorySink {
    fn write(&self, record: &LogRecord) -> io::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
