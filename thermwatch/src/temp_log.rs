//! Rotating log of high temperatures.
//!
//! Only readings above [`LOG_FLOOR_CELSIUS`] are written. Each entry is one
//! line, colored by [`TemperatureBand`]:
//!
//! ```text
//! \x1b[0;35m[2024-05-01 14:03:22] Temperature: 70.00°C\x1b[0m
//! ```
//!
//! When the file has reached [`LOG_SIZE_LIMIT`] bytes it is renamed to
//! `<path>.bak` before the next entry, replacing any earlier backup.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{debug, warn};

use crate::band::{RESET, TemperatureBand};

/// Readings at or below this temperature are not logged.
pub const LOG_FLOOR_CELSIUS: f64 = 65.0;

/// Size at which the log is rotated (1 MiB).
pub const LOG_SIZE_LIMIT: u64 = 1_048_576;

/// Suffix appended to the log path for the rotated file.
pub const BACKUP_SUFFIX: &str = ".bak";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Temperature log errors.
#[derive(Debug, Error)]
pub enum TempLogError {
    #[error("Failed to open log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write log file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What a call to [`TemperatureLog::record`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The reading was at or below the floor; nothing was touched.
    Skipped,
    /// A line was appended, after rotating the file if `rotated` is set.
    Written { rotated: bool },
}

/// Append-only temperature log with size-based rotation.
#[derive(Debug, Clone)]
pub struct TemperatureLog {
    path: PathBuf,
    backup_path: PathBuf,
    size_limit: u64,
}

impl TemperatureLog {
    /// Create a log writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_path = backup_path_for(&path);
        Self {
            path,
            backup_path,
            size_limit: LOG_SIZE_LIMIT,
        }
    }

    /// Override the rotation size.
    pub fn with_size_limit(mut self, bytes: u64) -> Self {
        self.size_limit = bytes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Record a temperature stamped with the current local time.
    pub fn record(&self, temperature: f64) -> Result<RecordOutcome, TempLogError> {
        self.record_at(temperature, Local::now())
    }

    /// Record a temperature with an explicit timestamp.
    pub fn record_at(
        &self,
        temperature: f64,
        at: DateTime<Local>,
    ) -> Result<RecordOutcome, TempLogError> {
        if temperature <= LOG_FLOOR_CELSIUS {
            return Ok(RecordOutcome::Skipped);
        }

        // A failed rename is not fatal; the entry still goes to the current file.
        let rotated = match self.rotate_if_needed() {
            Ok(rotated) => rotated,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    backup = %self.backup_path.display(),
                    error = %e,
                    "Failed to rotate temperature log"
                );
                false
            }
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| TempLogError::Open {
                path: self.path.clone(),
                source,
            })?;

        file.write_all(format_entry(temperature, at).as_bytes())
            .map_err(|source| TempLogError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), temperature, rotated, "Logged temperature");

        Ok(RecordOutcome::Written { rotated })
    }

    /// Rename the log to its backup path if it has reached the size limit.
    fn rotate_if_needed(&self) -> io::Result<bool> {
        let size = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        if size < self.size_limit {
            return Ok(false);
        }

        std::fs::rename(&self.path, &self.backup_path)?;
        Ok(true)
    }
}

/// Format one log line, including the trailing newline.
pub fn format_entry(temperature: f64, at: DateTime<Local>) -> String {
    format!(
        "{}[{}] Temperature: {:.2}°C{}\n",
        TemperatureBand::classify(temperature).color(),
        at.format(TIMESTAMP_FORMAT),
        temperature,
        RESET
    )
}

/// `<path>.bak`, keeping the full original file name.
fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}
