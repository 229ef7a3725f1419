//! Calendar days and the wall clock.
//!
//! A [`DayKey`] names one calendar day in the deployment's zone. It partitions
//! the live cache (which only ever holds "today") and the write-once archive
//! (which only ever holds days before today). [`DayCalendar`] maps instants to
//! days and days back to their UTC span; [`Clock`] is the injected source of
//! "now" so rollover can be driven deterministically in tests.

use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicI64, Ordering},
};

use anyhow::Context;
use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::tz::{self, DstPolicy};

/// One calendar day, `YYYY-MM-DD`, in the configured zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Wrap a date.
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from year/month/day; `None` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The underlying date.
    pub const fn date(&self) -> NaiveDate {
        self.0
    }

    /// The following day.
    pub fn succ(&self) -> Option<Self> {
        self.0.checked_add_days(Days::new(1)).map(Self)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let d = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("bad day key (want YYYY-MM-DD): {s}"))?;
        Ok(Self(d))
    }
}

/// Maps instants to [`DayKey`]s and back, in one fixed zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCalendar {
    tz: Tz,
}

impl DayCalendar {
    /// Calendar for the given zone.
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Calendar whose days are UTC days.
    pub const fn utc() -> Self {
        Self { tz: chrono_tz::UTC }
    }

    /// The zone days are computed in.
    pub const fn tz(&self) -> Tz {
        self.tz
    }

    /// The local day an instant falls on.
    pub fn day_of(&self, t: DateTime<Utc>) -> DayKey {
        DayKey(t.with_timezone(&self.tz).date_naive())
    }

    /// UTC instant of local midnight starting `day`.
    pub fn start_of(&self, day: DayKey) -> anyhow::Result<DateTime<Utc>> {
        let midnight = day
            .0
            .and_hms_opt(0, 0, 0)
            .with_context(|| format!("no midnight for {day}"))?;
        tz::from_local_naive_with_policy(midnight, self.tz, DstPolicy::Lenient)
    }

    /// Half-open UTC span `[start, end)` covered by `day`.
    pub fn bounds(&self, day: DayKey) -> anyhow::Result<(DateTime<Utc>, DateTime<Utc>)> {
        let next = day
            .succ()
            .with_context(|| format!("no day after {day}"))?;
        Ok((self.start_of(day)?, self.start_of(next)?))
    }
}

impl Default for DayCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Now, in UTC.
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Millisecond resolution.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Clock frozen at `t`.
    pub fn new(t: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(t.timestamp_millis()),
        }
    }

    /// Jump to `t`.
    pub fn set(&self, t: DateTime<Utc>) {
        self.millis.store(t.timestamp_millis(), Ordering::SeqCst);
    }

    /// Move forward by `d`.
    pub fn advance(&self, d: chrono::Duration) {
        self.millis.fetch_add(d.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.millis.load(Ordering::SeqCst);
        DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}
