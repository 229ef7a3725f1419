//! SQLite implementation of [`ReadingStore`] and [`ArchiveStore`].

use std::collections::BTreeSet;

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::{prelude::*, sql_types::Text};
use tracing::{debug, info};

use crate::{
    day::{DayCalendar, DayKey},
    db::connection::connect_sqlite,
    models::{NewArchiveRow, NewSensorRow, Reading, SensorRow},
    schema::{history_cache::dsl as hc, sensor_data::dsl as sd},
    store::{ArchiveStore, ReadingSink, ReadingStore, StoreError, StoreResult},
    tz,
};

/// Store backed by one SQLite connection.
///
/// Day boundaries are computed with the supplied [`DayCalendar`], so the same
/// database can be viewed in different zones without rewriting rows.
pub struct SqliteStore {
    conn: SqliteConnection,
    calendar: DayCalendar,
}

impl SqliteStore {
    /// Wrap an existing connection (PRAGMAs and migrations are the caller's business).
    pub fn new(conn: SqliteConnection, calendar: DayCalendar) -> Self {
        Self { conn, calendar }
    }

    /// Open `database_url` with [`connect_sqlite`].
    pub fn open(database_url: &str, calendar: DayCalendar) -> anyhow::Result<Self> {
        let conn = connect_sqlite(database_url)
            .with_context(|| format!("open sqlite at {database_url}"))?;
        Ok(Self::new(conn, calendar))
    }

    /// The calendar used for day filtering.
    pub fn calendar(&self) -> DayCalendar {
        self.calendar
    }

    /// Direct access for ad-hoc queries (tests, maintenance).
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

fn into_readings(rows: Vec<SensorRow>) -> StoreResult<Vec<Reading>> {
    rows.into_iter().map(Reading::try_from).collect()
}

impl ReadingStore for SqliteStore {
    fn fetch_after_id(&mut self, after: u64) -> StoreResult<Vec<Reading>> {
        // ids past i64::MAX cannot exist in SQLite
        let after = i64::try_from(after).unwrap_or(i64::MAX);
        let rows = sd::sensor_data
            .filter(sd::id.gt(after))
            .order(sd::id.asc())
            .select(SensorRow::as_select())
            .load(&mut self.conn)?;
        into_readings(rows)
    }

    fn fetch_for_day(&mut self, day: DayKey) -> StoreResult<Vec<Reading>> {
        let (start, end) = self.calendar.bounds(day)?;
        let (start, end) = (tz::to_rfc3339_millis(start), tz::to_rfc3339_millis(end));

        // Fixed-width UTC text compares in chronological order.
        let rows = sd::sensor_data
            .filter(sd::recorded_at.ge(&start).and(sd::recorded_at.lt(&end)))
            .order(sd::id.asc())
            .select(SensorRow::as_select())
            .load(&mut self.conn)?;
        debug!(%day, rows = rows.len(), "fetched day from store");
        into_readings(rows)
    }

    fn available_days(&mut self) -> StoreResult<Vec<DayKey>> {
        // Minute prefixes never straddle a local midnight: every real UTC offset
        // is a whole number of minutes.
        let minutes: Vec<String> = sd::sensor_data
            .select(diesel::dsl::sql::<Text>("substr(recorded_at, 1, 16)"))
            .distinct()
            .load(&mut self.conn)?;

        let mut days = BTreeSet::new();
        for m in minutes {
            let naive = NaiveDateTime::parse_from_str(&m, "%Y-%m-%dT%H:%M")
                .with_context(|| format!("bad recorded_at prefix: {m}"))?;
            days.insert(self.calendar.day_of(naive.and_utc()));
        }
        Ok(days.into_iter().rev().collect())
    }
}

impl ReadingSink for SqliteStore {
    fn insert_reading(&mut self, at: DateTime<Utc>, co2_ppm: f64) -> StoreResult<u64> {
        let recorded_at = tz::to_rfc3339_millis(at);
        let row = NewSensorRow {
            recorded_at: &recorded_at,
            co2_ppm,
        };
        let id: i64 = diesel::insert_into(sd::sensor_data)
            .values(&row)
            .returning(sd::id)
            .get_result(&mut self.conn)?;
        u64::try_from(id).with_context(|| format!("sqlite returned negative id {id}"))
    }
}

impl ArchiveStore for SqliteStore {
    fn fetch_archive(&mut self, day: DayKey) -> StoreResult<Option<Vec<Reading>>> {
        let key = day.to_string();
        let json: Option<String> = hc::history_cache
            .filter(hc::date_key.eq(&key))
            .select(hc::data_json)
            .first(&mut self.conn)
            .optional()?;

        match json {
            Some(s) => {
                let readings = serde_json::from_str(&s)
                    .map_err(|source| StoreError::CorruptArchive { day, source })?;
                Ok(Some(readings))
            }
            None => Ok(None),
        }
    }

    fn write_archive(&mut self, day: DayKey, readings: &[Reading]) -> StoreResult<bool> {
        let key = day.to_string();
        let json = serde_json::to_string(readings)?;
        let row = NewArchiveRow {
            date_key: &key,
            data_json: &json,
        };

        // Write-once: an existing memo for the day always wins.
        let n = diesel::insert_into(hc::history_cache)
            .values(&row)
            .on_conflict(hc::date_key)
            .do_nothing()
            .execute(&mut self.conn)?;

        if n == 1 {
            info!(%day, readings = readings.len(), "archived day");
        } else {
            debug!(%day, "archive already present; write skipped");
        }
        Ok(n == 1)
    }
}
