//! Stride-based thinning for display.

/// Reduce `series` to roughly `max_points` samples by keeping every
/// `ceil(len / max_points)`-th sample, starting at index 0.
///
/// The newest sample is always kept: when the stride does not land on it, it is
/// appended, so the result can hold `max_points + 1` samples. Series that
/// already fit are returned unchanged. A budget of zero is treated as one.
pub fn downsample<T: Clone>(series: &[T], max_points: usize) -> Vec<T> {
    let max_points = max_points.max(1);
    let n = series.len();
    if n <= max_points {
        return series.to_vec();
    }

    let stride = n.div_ceil(max_points);
    let mut out: Vec<T> = series.iter().step_by(stride).cloned().collect();
    if (n - 1) % stride != 0 {
        out.push(series[n - 1].clone());
    }
    out
}
