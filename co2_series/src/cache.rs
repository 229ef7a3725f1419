//! Rolling cache of today's readings with incremental refresh.
//!
//! The reading table is append-only with monotonically increasing ids, so once
//! a day has been loaded every later poll only needs the rows past the last id
//! seen. A full reload happens only on a day change or when the cache is empty.
//!
//! Store failures never reach the caller: the cache keeps its last good state
//! and hands that back, so a flaky database degrades to stale data rather than
//! an empty chart or a dead poll loop.

use tracing::{debug, warn};

use crate::{day::DayKey, models::Reading, store::ReadingStore};

/// Cached state for one day.
///
/// Invariants: `readings` ascending by id without duplicates, `last_id` equals
/// the id of the final reading whenever there is one, every reading belongs to
/// `day`.
#[derive(Debug, Clone, Default)]
pub struct SeriesCache {
    day: Option<DayKey>,
    readings: Vec<Reading>,
    last_id: Option<u64>,
}

impl SeriesCache {
    /// An empty (cold) cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The day the cached readings belong to, once loaded.
    pub fn day(&self) -> Option<DayKey> {
        self.day
    }

    /// Id of the newest cached reading.
    pub fn last_id(&self) -> Option<u64> {
        self.last_id
    }

    /// Number of cached readings.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Bring the cache up to date for `today` and return a copy of it.
    pub fn refresh<S: ReadingStore + ?Sized>(&mut self, store: &mut S, today: DayKey) -> Vec<Reading> {
        if self.day != Some(today) || self.readings.is_empty() {
            match store.fetch_for_day(today) {
                Ok(rows) => {
                    debug!(%today, rows = rows.len(), "full cache load");
                    self.last_id = rows.last().map(|r| r.id);
                    self.readings = rows;
                    self.day = Some(today);
                }
                Err(e) => warn!(%today, error = %e, "full cache load failed; serving previous cache"),
            }
        } else if let Some(after) = self.last_id {
            match store.fetch_after_id(after) {
                Ok(rows) => self.append(rows),
                Err(e) => warn!(after, error = %e, "incremental fetch failed; serving previous cache"),
            }
        }
        self.readings.clone()
    }

    fn append(&mut self, rows: Vec<Reading>) {
        if rows.is_empty() {
            return;
        }
        let before = self.readings.len();
        let mut last = self.last_id;
        for r in rows {
            // A store that ignores the id bound must not break ordering.
            if last.is_some_and(|l| r.id <= l) {
                continue;
            }
            last = Some(r.id);
            self.readings.push(r);
        }
        self.last_id = last;
        debug!(appended = self.readings.len() - before, last_id = ?self.last_id, "incremental cache update");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    /// In-memory store that records which fetch paths were used.
    #[derive(Default)]
    struct FakeStore {
        rows: Vec<(DayKey, Reading)>,
        fail: bool,
        full_fetches: usize,
        incremental: Vec<u64>,
        last_incremental_ids: Vec<u64>,
    }

    impl FakeStore {
        fn push(&mut self, day: DayKey, id: u64, value: f64) {
            let t0: DateTime<Utc> = Utc.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();
            self.rows
                .push((day, Reading::new(id, t0 + Duration::seconds(3 * id as i64), value)));
        }
    }

    impl ReadingStore for FakeStore {
        fn fetch_after_id(&mut self, after: u64) -> anyhow::Result<Vec<Reading>> {
            if self.fail {
                anyhow::bail!("store unreachable");
            }
            self.incremental.push(after);
            let out: Vec<Reading> = self
                .rows
                .iter()
                .filter(|(_, r)| r.id > after)
                .map(|(_, r)| *r)
                .collect();
            self.last_incremental_ids = out.iter().map(|r| r.id).collect();
            Ok(out)
        }

        fn fetch_for_day(&mut self, day: DayKey) -> anyhow::Result<Vec<Reading>> {
            if self.fail {
                anyhow::bail!("store unreachable");
            }
            self.full_fetches += 1;
            Ok(self
                .rows
                .iter()
                .filter(|(d, _)| *d == day)
                .map(|(_, r)| *r)
                .collect())
        }

        fn available_days(&mut self) -> anyhow::Result<Vec<DayKey>> {
            Ok(vec![])
        }
    }

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    fn ids(rs: &[Reading]) -> Vec<u64> {
        rs.iter().map(|r| r.id).collect()
    }

    #[test]
    fn cold_start_then_incremental() {
        let today = day("2025-01-05");
        let mut store = FakeStore::default();
        for id in 1..=3 {
            store.push(today, id, 600.0);
        }

        let mut cache = SeriesCache::new();
        let got = cache.refresh(&mut store, today);
        assert_eq!(ids(&got), vec![1, 2, 3]);
        assert_eq!(cache.last_id(), Some(3));
        assert_eq!(store.full_fetches, 1);

        store.push(today, 4, 610.0);
        let got = cache.refresh(&mut store, today);
        assert_eq!(ids(&got), vec![1, 2, 3, 4]);
        assert_eq!(store.full_fetches, 1, "second refresh must not reload the day");
        assert_eq!(store.incremental, vec![3]);
        assert_eq!(store.last_incremental_ids, vec![4]);
        assert_eq!(cache.last_id(), Some(4));
    }

    #[test]
    fn day_change_triggers_full_reload() {
        let d1 = day("2025-01-05");
        let d2 = day("2025-01-06");
        let mut store = FakeStore::default();
        store.push(d1, 1, 600.0);
        store.push(d1, 2, 610.0);

        let mut cache = SeriesCache::new();
        assert_eq!(cache.refresh(&mut store, d1).len(), 2);

        store.push(d2, 3, 700.0);
        let got = cache.refresh(&mut store, d2);
        assert_eq!(ids(&got), vec![3]);
        assert_eq!(cache.day(), Some(d2));
        assert_eq!(store.full_fetches, 2);
    }

    #[test]
    fn empty_day_keeps_retrying_full_load() {
        let today = day("2025-01-05");
        let mut store = FakeStore::default();
        let mut cache = SeriesCache::new();

        assert!(cache.refresh(&mut store, today).is_empty());
        assert_eq!(cache.last_id(), None);
        assert!(cache.refresh(&mut store, today).is_empty());
        assert_eq!(store.full_fetches, 2);
        assert!(store.incremental.is_empty());
    }

    #[test]
    fn store_failure_serves_previous_snapshot() {
        let today = day("2025-01-05");
        let mut store = FakeStore::default();
        store.push(today, 1, 600.0);
        store.push(today, 2, 605.0);

        let mut cache = SeriesCache::new();
        cache.refresh(&mut store, today);

        store.fail = true;
        let got = cache.refresh(&mut store, today);
        assert_eq!(ids(&got), vec![1, 2]);
        assert_eq!(cache.last_id(), Some(2));
    }

    #[test]
    fn store_failure_on_cold_start_is_empty() {
        let mut store = FakeStore {
            fail: true,
            ..Default::default()
        };
        let mut cache = SeriesCache::new();
        assert!(cache.refresh(&mut store, day("2025-01-05")).is_empty());
        assert_eq!(cache.day(), None);
    }

    #[test]
    fn returned_copy_cannot_corrupt_cache() {
        let today = day("2025-01-05");
        let mut store = FakeStore::default();
        store.push(today, 1, 600.0);

        let mut cache = SeriesCache::new();
        let mut got = cache.refresh(&mut store, today);
        got.clear();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn stale_ids_from_store_are_ignored() {
        let mut cache = SeriesCache::new();
        let t = Utc.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();
        cache.day = Some(day("2025-01-05"));
        cache.readings = vec![Reading::new(5, t, 1.0)];
        cache.last_id = Some(5);

        cache.append(vec![Reading::new(4, t, 1.0), Reading::new(6, t, 1.0)]);
        assert_eq!(ids(&cache.readings), vec![5, 6]);
        assert_eq!(cache.last_id(), Some(6));
    }
}
