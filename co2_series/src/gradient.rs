//! Finite-difference derivative on a non-uniform grid.

/// Numerical derivative of `y` with respect to `x`.
///
/// One-sided differences at the ends, central differences inside. Wherever the
/// spacing in the denominator is zero (duplicate timestamps) the result is 0.
/// `x` must be non-decreasing. The output always has `y.len()` entries; only
/// the first `min(y.len(), x.len())` are computed, the rest stay 0.
pub fn gradient(y: &[f64], x: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; y.len()];
    let n = y.len().min(x.len());
    if n < 2 {
        return out;
    }

    let diff = |hi: usize, lo: usize| {
        let dx = x[hi] - x[lo];
        if dx == 0.0 { 0.0 } else { (y[hi] - y[lo]) / dx }
    };

    out[0] = diff(1, 0);
    for i in 1..n - 1 {
        out[i] = diff(i + 1, i - 1);
    }
    out[n - 1] = diff(n - 1, n - 2);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_inputs_are_zero() {
        assert!(gradient(&[], &[]).is_empty());
        assert_eq!(gradient(&[5.0], &[0.0]), vec![0.0]);
    }

    #[test]
    fn non_uniform_spacing() {
        let x = [0.0, 1.0, 3.0, 6.0];
        let y = [0.0, 2.0, 4.0, 10.0];
        let g = gradient(&y, &x);
        assert_eq!(g[0], 2.0);
        assert_eq!(g[1], 4.0 / 3.0);
        assert_eq!(g[2], 8.0 / 5.0);
        assert_eq!(g[3], 2.0);
    }

    #[test]
    fn duplicate_timestamps_give_zero() {
        let x = [0.0, 0.0, 0.0];
        let y = [1.0, 2.0, 3.0];
        assert_eq!(gradient(&y, &x), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn short_grid_leaves_tail_zero() {
        let g = gradient(&[0.0, 2.0, 4.0, 9.0], &[0.0, 1.0, 2.0]);
        assert_eq!(g, vec![2.0, 2.0, 2.0, 0.0]);
        assert_eq!(gradient(&[1.0, 5.0], &[0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn linear_series_has_constant_slope() {
        let x: Vec<f64> = (0..10).map(|i| i as f64 * 0.05).collect();
        let y: Vec<f64> = x.iter().map(|t| 600.0 + 40.0 * t).collect();
        assert!(gradient(&y, &x).iter().all(|g| (g - 40.0).abs() < 1e-9));
    }

    proptest! {
        #[test]
        fn uniform_interior_is_central_difference(
            y in proptest::collection::vec(0.0f64..3000.0, 3..100),
            h in 0.01f64..10.0,
        ) {
            let x: Vec<f64> = (0..y.len()).map(|i| i as f64 * h).collect();
            let g = gradient(&y, &x);
            for i in 1..y.len() - 1 {
                let want = (y[i + 1] - y[i - 1]) / (2.0 * h);
                prop_assert!((g[i] - want).abs() <= 1e-6 * (1.0 + want.abs()));
            }
        }
    }
}
