//! Service facade: live polling, day history, and presentation payloads.
//!
//! A [`Monitor`] owns the store and the [`SeriesCache`] behind one `Mutex`, so
//! refreshes and history lookups never interleave. Every refresh also
//! publishes its copy of today's series through an `ArcSwap` before releasing
//! the lock, letting readers take [`Monitor::snapshot`] without touching it.
//! Signal processing always runs after the lock is released.
//!
//! Only the live series is downsampled for display; a history day is
//! processed in full.
//!
//! Nothing here fails: store errors are logged and answered with stale or
//! empty data, and an empty series produces no payload at all.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    cache::SeriesCache,
    config::Settings,
    day::{Clock, DayCalendar, DayKey},
    downsample::downsample,
    dwell::DwellStats,
    models::Reading,
    pipeline::{ChartPoint, Pipeline},
    status::{Status, StatusThresholds, classify},
    store::{ArchiveStore, ReadingStore},
    summary::Summary,
};

/// Everything a dashboard needs to render one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    /// Headline numbers.
    pub summary: Summary,
    /// Status of the current value.
    pub status: Status,
    /// Per-sample chart data; the live series is downsampled to the display budget.
    pub chart_points: Vec<ChartPoint>,
    /// Dwell totals rounded to one decimal.
    pub dwell_stats: DwellStats,
    /// Time of the newest reading.
    pub last_update: DateTime<Utc>,
    /// `true` for today's live series, `false` for an archived day.
    pub live: bool,
    /// Smoothing fell back to raw values.
    pub degraded: bool,
}

struct Backend<S> {
    store: S,
    cache: SeriesCache,
}

/// Live + history access over one store.
pub struct Monitor<S, C> {
    backend: Mutex<Backend<S>>,
    latest: ArcSwap<Vec<Reading>>,
    clock: C,
    calendar: DayCalendar,
    pipeline: Pipeline,
    thresholds: StatusThresholds,
    max_points: usize,
}

impl<S, C> Monitor<S, C>
where
    S: ReadingStore + ArchiveStore,
    C: Clock,
{
    /// Build a monitor from validated settings.
    pub fn new(store: S, clock: C, settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            backend: Mutex::new(Backend {
                store,
                cache: SeriesCache::new(),
            }),
            latest: ArcSwap::from_pointee(Vec::new()),
            clock,
            calendar: settings.calendar()?,
            pipeline: Pipeline::new(settings.pipeline.smoothing_window, settings.dwell),
            thresholds: settings.status,
            max_points: settings.pipeline.max_points,
        })
    }

    /// The day "now" falls on.
    pub fn today(&self) -> DayKey {
        self.calendar.day_of(self.clock.now())
    }

    /// The calendar days are computed in.
    pub fn calendar(&self) -> DayCalendar {
        self.calendar
    }

    /// Refresh the cache for today and return a copy of the series.
    pub fn refresh_today(&self) -> Vec<Reading> {
        let today = self.today();
        let mut b = self.lock();
        let Backend { store, cache } = &mut *b;
        let readings = cache.refresh(store, today);
        // Publish under the lock so snapshots follow refresh order.
        self.latest.store(Arc::new(readings.clone()));
        readings
    }

    /// The series published by the most recent refresh, without locking.
    pub fn snapshot(&self) -> Arc<Vec<Reading>> {
        self.latest.load_full()
    }

    /// Refresh and build today's payload; `None` while today has no readings.
    pub fn live_payload(&self) -> Option<Payload> {
        let readings = self.refresh_today();
        let shown = downsample(&readings, self.max_points);
        self.payload(&shown, true)
    }

    /// Payload for any day; `None` when the day has no readings.
    ///
    /// Days before today are served from the archive, filling it on first
    /// access. Today (or later) always comes from the store and is never
    /// archived, since it may still grow.
    pub fn history_payload(&self, day: DayKey) -> Option<Payload> {
        let readings = self.history_readings(day);
        self.payload(&readings, false)
    }

    /// Raw readings for `day`, using and filling the archive for past days.
    pub fn history_readings(&self, day: DayKey) -> Vec<Reading> {
        let finished = day < self.today();
        let mut b = self.lock();
        let store = &mut b.store;

        if finished {
            match store.fetch_archive(day) {
                Ok(Some(readings)) => {
                    debug!(%day, readings = readings.len(), "archive hit");
                    return readings;
                }
                Ok(None) => debug!(%day, "archive miss"),
                Err(e) => warn!(%day, error = %e, "archive read failed; falling back to store"),
            }
        }

        let readings = match store.fetch_for_day(day) {
            Ok(r) => r,
            Err(e) => {
                warn!(%day, error = %e, "history fetch failed");
                return Vec::new();
            }
        };

        if finished && !readings.is_empty() {
            if let Err(e) = store.write_archive(day, &readings) {
                warn!(%day, error = %e, "archive write failed");
            }
        }
        readings
    }

    /// Days that have readings, newest first; empty if the store is unreachable.
    pub fn available_days(&self) -> Vec<DayKey> {
        match self.lock().store.available_days() {
            Ok(days) => days,
            Err(e) => {
                warn!(error = %e, "listing available days failed");
                Vec::new()
            }
        }
    }

    /// Run `f` against the store while holding the backend lock.
    pub fn with_store<T>(&self, f: impl FnOnce(&mut S) -> T) -> T {
        f(&mut self.lock().store)
    }

    fn payload(&self, readings: &[Reading], live: bool) -> Option<Payload> {
        let last = readings.last()?;
        let processed = self.pipeline.process(readings);
        let current = processed.summary.current.map_or(f64::NAN, |v| v as f64);

        Some(Payload {
            status: classify(current, &self.thresholds),
            summary: processed.summary,
            chart_points: processed.chart_points,
            dwell_stats: processed.dwell_stats.rounded(),
            last_update: last.timestamp,
            live,
            degraded: processed.degraded,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Backend<S>> {
        // The backend holds no invariant a panicking reader could break.
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
