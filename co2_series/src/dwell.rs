//! Time spent in each concentration band.
//!
//! Sample `i >= 1` accrues `elapsed[i] - elapsed[i-1]` minutes to the band its
//! smoothed value falls in. Sample 0 accrues the first step
//! `elapsed[1] - elapsed[0]`, so the totals come to the elapsed span plus one
//! leading step. A lone sample is credited a nominal [`SINGLE_SAMPLE_MINUTES`].

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Stand-in for non-positive time steps (duplicate or out-of-order timestamps).
pub const MIN_STEP_MINUTES: f64 = 0.01;

/// Credit given to a series of exactly one sample.
pub const SINGLE_SAMPLE_MINUTES: f64 = 1.0;

/// Band edges for dwell accounting, in ppm.
///
/// These are deliberately separate from the display thresholds in
/// [`crate::status::StatusThresholds`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DwellBands {
    /// Values below this are "low".
    pub mid: f64,
    /// Values at or above this are "high"; between `mid` and `high` is "mid".
    pub high: f64,
}

impl Default for DwellBands {
    fn default() -> Self {
        Self {
            mid: 1000.0,
            high: 1500.0,
        }
    }
}

impl DwellBands {
    /// Which band `value` falls in.
    pub fn band_of(&self, value: f64) -> DwellBand {
        if value < self.mid {
            DwellBand::Low
        } else if value < self.high {
            DwellBand::Mid
        } else {
            DwellBand::High
        }
    }
}

/// One of the three dwell bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellBand {
    /// Below `mid`.
    Low,
    /// `mid..high`.
    Mid,
    /// `high` and above.
    High,
}

/// Minutes spent per band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DwellStats {
    /// Minutes in the low band.
    pub low_minutes: f64,
    /// Minutes in the mid band.
    pub mid_minutes: f64,
    /// Minutes in the high band.
    pub high_minutes: f64,
}

impl DwellStats {
    /// Sum over all bands.
    pub fn total(&self) -> f64 {
        self.low_minutes + self.mid_minutes + self.high_minutes
    }

    /// Copy rounded to one decimal, for presentation.
    pub fn rounded(&self) -> Self {
        let r = |v: f64| (v * 10.0).round() / 10.0;
        Self {
            low_minutes: r(self.low_minutes),
            mid_minutes: r(self.mid_minutes),
            high_minutes: r(self.high_minutes),
        }
    }

    fn add(&mut self, band: DwellBand, minutes: f64) {
        match band {
            DwellBand::Low => self.low_minutes += minutes,
            DwellBand::Mid => self.mid_minutes += minutes,
            DwellBand::High => self.high_minutes += minutes,
        }
    }
}

/// Accumulate time per band.
///
/// `smoothed` and `elapsed_minutes` are parallel; extra entries in the longer
/// one are ignored.
pub fn aggregate(smoothed: &[f64], elapsed_minutes: &[f64], bands: &DwellBands) -> DwellStats {
    let n = smoothed.len().min(elapsed_minutes.len());
    let mut stats = DwellStats::default();
    match n {
        0 => return stats,
        1 => {
            stats.add(bands.band_of(smoothed[0]), SINGLE_SAMPLE_MINUTES);
            return stats;
        }
        _ => {}
    }

    let mut clamped = 0usize;
    for i in 0..n {
        let mut dt = if i == 0 {
            elapsed_minutes[1] - elapsed_minutes[0]
        } else {
            elapsed_minutes[i] - elapsed_minutes[i - 1]
        };
        if dt <= 0.0 || dt.is_nan() {
            dt = MIN_STEP_MINUTES;
            clamped += 1;
        }
        stats.add(bands.band_of(smoothed[i]), dt);
    }

    if clamped > 0 {
        warn!(clamped, samples = n, "non-increasing timestamps; clamped time steps");
    }
    stats
}
