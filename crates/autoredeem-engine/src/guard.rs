//! At-most-once-per-day execution gate.
//!
//! Advisory only: a crash after acquiring leaves the day marked done without a
//! transfer. Deleting the day's record is the manual way to retry.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const LOCK_PREFIX: &str = "transfer_completed_";
pub const LOCK_EXTENSION: &str = "lock";

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Failed to access run ledger at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write run record {path}: {source}")]
    Record {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Marker that the workflow ran on `date`. Stored as JSON in the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub date: NaiveDate,
    pub created_at: DateTime<Local>,
}

impl LockRecord {
    pub fn new(created_at: DateTime<Local>) -> Self {
        Self {
            date: created_at.date_naive(),
            created_at,
        }
    }
}

/// Storage for per-day run markers.
pub trait RunLedger: Send + Sync {
    fn has_run_on(&self, date: NaiveDate) -> Result<bool, GuardError>;

    /// Persist `record`. Returns `false` if a record for that day already exists.
    fn mark_ran(&self, record: &LockRecord) -> Result<bool, GuardError>;
}

/// One `transfer_completed_<YYYY-MM-DD>.lock` file per day in the artifact directory.
#[derive(Debug, Clone)]
pub struct FileRunLedger {
    dir: PathBuf,
}

impl FileRunLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn lock_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(lock_file_name(date))
    }
}

pub fn lock_file_name(date: NaiveDate) -> String {
    format!(
        "{}{}.{}",
        LOCK_PREFIX,
        date.format("%Y-%m-%d"),
        LOCK_EXTENSION
    )
}

impl RunLedger for FileRunLedger {
    fn has_run_on(&self, date: NaiveDate) -> Result<bool, GuardError> {
        let path = self.lock_path(date);
        path.try_exists().map_err(|source| GuardError::Io { path, source })
    }

    fn mark_ran(&self, record: &LockRecord) -> Result<bool, GuardError> {
        fs::create_dir_all(&self.dir).map_err(|source| GuardError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.lock_path(record.date);
        // create_new so two racing processes cannot both claim the day
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(source) => return Err(GuardError::Io { path, source }),
        };
        serde_json::to_writer_pretty(file, record)
            .map_err(|source| GuardError::Record { path, source })?;
        Ok(true)
    }
}

pub struct IdempotencyGuard<L: RunLedger = FileRunLedger> {
    ledger: L,
}

impl<L: RunLedger> IdempotencyGuard<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Claim today. `false` means the workflow already ran today and the
    /// caller must stop without side effects.
    pub fn try_acquire_today(&self) -> Result<bool, GuardError> {
        self.try_acquire_at(Local::now())
    }

    pub fn try_acquire_at(&self, now: DateTime<Local>) -> Result<bool, GuardError> {
        let record = LockRecord::new(now);
        if self.ledger.has_run_on(record.date)? {
            info!(
                "Transfer already completed today ({}). Lock record exists.",
                record.date
            );
            return Ok(false);
        }
        let acquired = self.ledger.mark_ran(&record)?;
        if !acquired {
            info!("Another run claimed {} first", record.date);
        }
        Ok(acquired)
    }

    pub fn has_run_today(&self) -> Result<bool, GuardError> {
        self.ledger.has_run_on(Local::now().date_naive())
    }
}
