//! Reading types and the Diesel rows behind them.
//!
//! These types mirror the tables defined in the embedded migrations and in
//! [`crate::schema`]:
//! - [`crate::schema::sensor_data`]: append-only readings, id assigned by SQLite
//! - [`crate::schema::history_cache`]: write-once JSON memo per finished day
//!
//! Rows keep SQLite's representation (i64 ids, RFC3339 text); [`Reading`] is the
//! typed value the rest of the crate works with.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{history_cache, sensor_data};
use crate::tz;

/// One stored concentration measurement.
///
/// Identity and order are both given by `id`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Store-assigned, strictly increasing.
    pub id: u64,
    /// When the value was recorded.
    pub timestamp: DateTime<Utc>,
    /// Concentration in ppm.
    pub value: f64,
}

impl Reading {
    /// Convenience constructor.
    pub const fn new(id: u64, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            id,
            timestamp,
            value,
        }
    }
}

/// A row in [`crate::schema::sensor_data`].
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sensor_data, check_for_backend(diesel::sqlite::Sqlite))]
pub struct SensorRow {
    /// SQLite rowid.
    pub id: i64,
    /// RFC3339 UTC with millisecond precision.
    pub recorded_at: String,
    /// Concentration in ppm.
    pub co2_ppm: f64,
}

impl TryFrom<SensorRow> for Reading {
    type Error = anyhow::Error;

    fn try_from(row: SensorRow) -> Result<Self, Self::Error> {
        let id = u64::try_from(row.id)
            .map_err(|_| anyhow::anyhow!("negative sensor_data id {}", row.id))?;
        Ok(Reading {
            id,
            timestamp: tz::parse_ts_to_utc(&row.recorded_at)?,
            value: row.co2_ppm,
        })
    }
}

/// Insertable form of [`SensorRow`]; the id is left to SQLite.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sensor_data)]
pub struct NewSensorRow<'a> {
    /// RFC3339 UTC with millisecond precision.
    pub recorded_at: &'a str,
    /// Concentration in ppm.
    pub co2_ppm: f64,
}

/// A row in [`crate::schema::history_cache`].
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = history_cache, check_for_backend(diesel::sqlite::Sqlite))]
pub struct ArchiveRow {
    /// `YYYY-MM-DD` in the configured zone.
    pub date_key: String,
    /// JSON array of [`Reading`].
    pub data_json: String,
    /// When the memo was written (RFC3339 UTC).
    pub created_at: String,
}

/// Insertable form of [`ArchiveRow`]; `created_at` defaults in SQL.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = history_cache)]
pub struct NewArchiveRow<'a> {
    /// `YYYY-MM-DD` in the configured zone.
    pub date_key: &'a str,
    /// JSON array of [`Reading`].
    pub data_json: &'a str,
}
