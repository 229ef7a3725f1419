//! One pass from readings to chart points, dwell stats and summary.
//!
//! [`Pipeline::process`] is a pure function of its input: smooth the raw
//! values, differentiate twice against elapsed minutes, bucket the smoothed
//! values into dwell bands, and zip everything per sample.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::{
    dwell::{self, DwellBands, DwellStats},
    gradient::gradient,
    models::Reading,
    smoothing::{self, SmoothOutcome},
    summary::Summary,
};

/// Tunables for the processing pass and the display budget in front of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PipelineSettings {
    /// Display budget for [`crate::downsample::downsample`].
    pub max_points: usize,
    /// Savitzky-Golay window, in samples.
    pub smoothing_window: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_points: 1500,
            smoothing_window: smoothing::DEFAULT_WINDOW,
        }
    }
}

/// Per-sample output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Sample time.
    pub t: DateTime<Utc>,
    /// Value as stored.
    pub raw: f64,
    /// Value after smoothing.
    #[serde(serialize_with = "two_decimals")]
    pub smoothed: f64,
    /// First derivative, ppm per minute.
    #[serde(serialize_with = "two_decimals")]
    pub rate: f64,
    /// Second derivative, ppm per minute².
    #[serde(serialize_with = "two_decimals")]
    pub accel: f64,
}

/// Everything derived from one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedSeries {
    /// One point per input reading, same order.
    pub chart_points: Vec<ChartPoint>,
    /// Full-precision dwell totals.
    pub dwell_stats: DwellStats,
    /// KPIs over the raw values.
    pub summary: Summary,
    /// True when smoothing failed and raw values were used instead.
    pub degraded: bool,
}

impl ProcessedSeries {
    /// The result for an empty series.
    pub fn empty() -> Self {
        Self {
            chart_points: Vec::new(),
            dwell_stats: DwellStats::default(),
            summary: Summary::default(),
            degraded: false,
        }
    }
}

/// The processing pass, configured once.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pipeline {
    window: usize,
    bands: DwellBands,
}

impl Pipeline {
    /// Pipeline with an explicit window and dwell bands.
    pub fn new(window: usize, bands: DwellBands) -> Self {
        Self { window, bands }
    }

    /// Smooth, differentiate and aggregate `readings`.
    pub fn process(&self, readings: &[Reading]) -> ProcessedSeries {
        if readings.is_empty() {
            return ProcessedSeries::empty();
        }

        let raw: Vec<f64> = readings.iter().map(|r| r.value).collect();
        let minutes = elapsed_minutes(readings);

        let (smoothed, outcome) = smoothing::smooth_with_outcome(&raw, self.window);
        let rate = gradient(&smoothed, &minutes);
        let accel = gradient(&rate, &minutes);
        let dwell_stats = dwell::aggregate(&smoothed, &minutes, &self.bands);

        let chart_points = readings
            .iter()
            .enumerate()
            .map(|(i, r)| ChartPoint {
                t: r.timestamp,
                raw: raw[i],
                smoothed: smoothed[i],
                rate: rate[i],
                accel: accel[i],
            })
            .collect();

        ProcessedSeries {
            chart_points,
            dwell_stats,
            summary: Summary::of(&raw),
            degraded: matches!(outcome, SmoothOutcome::Degraded(_)),
        }
    }
}

/// Fractional minutes since the first reading.
pub fn elapsed_minutes(readings: &[Reading]) -> Vec<f64> {
    let Some(first) = readings.first() else {
        return Vec::new();
    };
    readings
        .iter()
        .map(|r| (r.timestamp - first.timestamp).num_milliseconds() as f64 / 60_000.0)
        .collect()
}

fn two_decimals<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((v * 100.0).round() / 100.0)
}
