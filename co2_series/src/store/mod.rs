//! Reading store + write-once day archive.
//!
//! The core only needs a handful of operations from persistence, so they are
//! split into two small traits: [`ReadingStore`] for the append-only reading
//! table and [`ArchiveStore`] for the memo of finished days. [`SqliteStore`]
//! implements both on top of Diesel; tests substitute in-memory fakes.

pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::{day::DayKey, models::Reading};

pub use sqlite::SqliteStore;

/// Errors with a meaning beyond "the query failed".
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The archived JSON for a day could not be decoded.
    #[error("archive for {day} is corrupt")]
    CorruptArchive {
        /// The day whose memo failed to decode.
        day: DayKey,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type used throughout the store layer for fallible operations.
pub type StoreResult<T> = anyhow::Result<T>;

/// Read side of the append-only reading table.
pub trait ReadingStore {
    /// All readings with `id > after`, ascending by id.
    fn fetch_after_id(&mut self, after: u64) -> StoreResult<Vec<Reading>>;

    /// All readings recorded during `day`, ascending by id.
    fn fetch_for_day(&mut self, day: DayKey) -> StoreResult<Vec<Reading>>;

    /// Days that have at least one reading, newest first.
    fn available_days(&mut self) -> StoreResult<Vec<DayKey>>;
}

/// Write-once memo of finished days.
pub trait ArchiveStore {
    /// The memoized readings for `day`, if the day was archived.
    fn fetch_archive(&mut self, day: DayKey) -> StoreResult<Option<Vec<Reading>>>;

    /// Memoize `readings` under `day`.
    ///
    /// Returns `false` when the day already had an entry; the existing entry is
    /// left untouched.
    fn write_archive(&mut self, day: DayKey, readings: &[Reading]) -> StoreResult<bool>;
}

/// Append side of the reading table.
pub trait ReadingSink {
    /// Append one reading stamped `at` and return its assigned id.
    fn insert_reading(&mut self, at: DateTime<Utc>, co2_ppm: f64) -> StoreResult<u64>;
}
