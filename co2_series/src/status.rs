//! Air-quality status shown next to the current reading.
//!
//! Uses its own thresholds (800 / 1200 ppm by default), independent of the dwell
//! bands in [`crate::dwell`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Display thresholds, in ppm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StatusThresholds {
    /// At or above this the air is no longer "excellent".
    pub warning: f64,
    /// At or above this the air is "dangerous".
    pub danger: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            warning: 800.0,
            danger: 1200.0,
        }
    }
}

/// Severity band of a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBand {
    /// Below `warning`.
    Excellent,
    /// `warning..danger`.
    Acceptable,
    /// `danger` and above.
    Dangerous,
    /// The value was not a number.
    NoData,
}

impl StatusBand {
    /// Human-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            StatusBand::Excellent => "excellent",
            StatusBand::Acceptable => "acceptable",
            StatusBand::Dangerous => "dangerous",
            StatusBand::NoData => "no data",
        }
    }

    /// CSS-style class name the presentation layer keys colours on.
    pub const fn css_class(&self) -> &'static str {
        match self {
            StatusBand::Excellent => "status-good",
            StatusBand::Acceptable => "status-warning",
            StatusBand::Dangerous => "status-danger",
            StatusBand::NoData => "status-neutral",
        }
    }
}

impl fmt::Display for StatusBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Human-readable label.
    pub label: &'static str,
    /// Band the value fell into.
    pub band: StatusBand,
}

impl From<StatusBand> for Status {
    fn from(band: StatusBand) -> Self {
        Status {
            label: band.label(),
            band,
        }
    }
}

/// Classify one concentration value.
pub fn classify(value: f64, thresholds: &StatusThresholds) -> Status {
    let band = if value.is_nan() {
        StatusBand::NoData
    } else if value < thresholds.warning {
        StatusBand::Excellent
    } else if value < thresholds.danger {
        StatusBand::Acceptable
    } else {
        StatusBand::Dangerous
    };
    band.into()
}
