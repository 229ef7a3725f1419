//! Headline numbers for a series: current, average, max, min.

use serde::{Serialize, Serializer};

/// Integer KPIs over the raw values, or `-` for each field when there are none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Newest value.
    #[serde(serialize_with = "dash_if_missing")]
    pub current: Option<i64>,
    /// Mean of all values.
    #[serde(serialize_with = "dash_if_missing")]
    pub avg: Option<i64>,
    /// Largest value.
    #[serde(serialize_with = "dash_if_missing")]
    pub max: Option<i64>,
    /// Smallest value.
    #[serde(serialize_with = "dash_if_missing")]
    pub min: Option<i64>,
}

impl Summary {
    /// Summarize `values`, skipping NaNs.
    pub fn of(values: &[f64]) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let Some(&last) = finite.last() else {
            return Self::default();
        };

        let sum: f64 = finite.iter().sum();
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        Self {
            current: Some(last.round() as i64),
            avg: Some((sum / finite.len() as f64).round() as i64),
            max: Some(max.round() as i64),
            min: Some(min.round() as i64),
        }
    }

    /// True when built from an empty series.
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

fn dash_if_missing<S: Serializer>(v: &Option<i64>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(n) => s.serialize_i64(*n),
        None => s.serialize_str("-"),
    }
}
