//! Savitzky-Golay smoothing (quadratic, symmetric window).
//!
//! A degree-2 least-squares fit over a sliding window of `2m + 1` samples,
//! evaluated at the window centre, reduces to a fixed convolution:
//!
//! ```text
//! c(i) = (3(3m² + 3m - 1) - 15 i²) / ((2m - 1)(2m + 1)(2m + 3)),   i = -m..=m
//! ```
//!
//! The filter only yields values where the whole window fits, i.e. for the
//! interior `m..n-m`. The `m` samples at each edge are copied from the raw
//! input at the same positions, so output length always equals input length.
//!
//! Smoothing is best-effort: short inputs and windows too small for a
//! quadratic fit pass through unchanged, and filter errors are logged and
//! answered with the raw input.

use thiserror::Error;
use tracing::warn;

/// Default window in samples.
pub const DEFAULT_WINDOW: usize = 15;

/// Inputs this short are never filtered.
const MIN_FILTER_LEN: usize = 5;

/// Smallest window that is filtered. A 3-sample quadratic fit interpolates exactly.
const MIN_FILTER_WINDOW: usize = 3;

/// Reasons the filter itself refuses to run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FilterError {
    /// Window must be odd and larger than the polynomial degree.
    #[error("invalid window {0}: must be odd and at least 3")]
    InvalidWindow(usize),
    /// Window longer than the data.
    #[error("window {window} exceeds input length {len}")]
    WindowTooLong {
        /// Requested window.
        window: usize,
        /// Input length.
        len: usize,
    },
    /// NaN or infinity in the input.
    #[error("non-finite input at index {0}")]
    NonFinite(usize),
}

/// What [`smooth_with_outcome`] ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum SmoothOutcome {
    /// The filter ran.
    Filtered {
        /// Window actually used.
        window: usize,
    },
    /// Not enough data for a meaningful fit; raw values passed through.
    Passthrough,
    /// The filter failed; raw values passed through.
    Degraded(FilterError),
}

/// Smooth `raw` with a quadratic Savitzky-Golay filter of (at most) `window` samples.
///
/// Always returns a vector of the same length as `raw`.
pub fn smooth(raw: &[f64], window: usize) -> Vec<f64> {
    smooth_with_outcome(raw, window).0
}

/// Like [`smooth`], but also reports whether the filter ran.
pub fn smooth_with_outcome(raw: &[f64], window: usize) -> (Vec<f64>, SmoothOutcome) {
    let mut effective = window.min(raw.len());
    if effective % 2 == 0 {
        effective = effective.saturating_sub(1);
    }

    if raw.len() <= MIN_FILTER_LEN || effective <= MIN_FILTER_WINDOW {
        return (raw.to_vec(), SmoothOutcome::Passthrough);
    }

    match savgol_interior(raw, effective) {
        Ok(interior) => (
            pad_edges(raw, interior, effective / 2),
            SmoothOutcome::Filtered { window: effective },
        ),
        Err(e) => {
            warn!(error = %e, len = raw.len(), window = effective, "smoothing failed; using raw values");
            (raw.to_vec(), SmoothOutcome::Degraded(e))
        }
    }
}

/// Convolution weights for a quadratic fit over `window` samples, centre first-to-last.
pub fn savgol_coefficients(window: usize) -> Result<Vec<f64>, FilterError> {
    if window < MIN_FILTER_WINDOW || window % 2 == 0 {
        return Err(FilterError::InvalidWindow(window));
    }
    let m = (window / 2) as f64;
    let norm = (2.0 * m - 1.0) * (2.0 * m + 1.0) * (2.0 * m + 3.0);
    let base = 3.0 * (3.0 * m * m + 3.0 * m - 1.0);
    let half = (window / 2) as i64;
    Ok((-half..=half)
        .map(|i| (base - 15.0 * (i * i) as f64) / norm)
        .collect())
}

/// Filtered values for indices `pad..len - pad`, where `pad = window / 2`.
pub fn savgol_interior(raw: &[f64], window: usize) -> Result<Vec<f64>, FilterError> {
    let coeffs = savgol_coefficients(window)?;
    if window > raw.len() {
        return Err(FilterError::WindowTooLong {
            window,
            len: raw.len(),
        });
    }
    if let Some(i) = raw.iter().position(|v| !v.is_finite()) {
        return Err(FilterError::NonFinite(i));
    }

    Ok(raw
        .windows(window)
        .map(|w| w.iter().zip(&coeffs).map(|(y, c)| y * c).sum())
        .collect())
}

fn pad_edges(raw: &[f64], interior: Vec<f64>, pad: usize) -> Vec<f64> {
    if interior.len() >= raw.len() {
        return interior;
    }
    let mut out = Vec::with_capacity(raw.len());
    out.extend_from_slice(&raw[..pad]);
    out.extend(interior);
    out.extend_from_slice(&raw[raw.len() - pad..]);
    out
}
