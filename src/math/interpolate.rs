//! Linear interpolation over a monotonically increasing time axis.

/// Piecewise-linear interpolation of `(xp, fp)` at `x`.
///
/// Values of `x` outside `[xp[0], xp[n-1]]` take the nearest endpoint value.
/// `xp` must be strictly increasing and non-empty.
#[must_use]
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    debug_assert!(!xp.is_empty());

    let last = xp.len() - 1;
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }

    // first index with xp[i] > x; guaranteed in 1..=last
    let hi = xp.partition_point(|&v| v <= x);
    let lo = hi - 1;
    let t = (x - xp[lo]) / (xp[hi] - xp[lo]);
    fp[lo] + t * (fp[hi] - fp[lo])
}

/// Fill interior `NaN` runs by interpolating linearly in time.
///
/// Leading `NaN` values take the first valid sample, trailing `NaN` values the
/// last one. A series without any valid sample is returned unchanged.
#[must_use]
pub fn fill_gaps(times: &[f64], values: &[f64]) -> Vec<f64> {
    let (valid_t, valid_v): (Vec<f64>, Vec<f64>) = times
        .iter()
        .zip(values)
        .filter(|(_, v)| !v.is_nan())
        .map(|(&t, &v)| (t, v))
        .unzip();

    if valid_t.is_empty() {
        return values.to_vec();
    }

    times
        .iter()
        .zip(values)
        .map(|(&t, &v)| if v.is_nan() { interp(t, &valid_t, &valid_v) } else { v })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interp() {
        let xp = [0.0, 1.0, 3.0];
        let fp = [0.0, 10.0, 30.0];

        assert_relative_eq!(interp(0.5, &xp, &fp), 5.0);
        assert_relative_eq!(interp(2.0, &xp, &fp), 20.0);
        assert_relative_eq!(interp(1.0, &xp, &fp), 10.0);
        assert_relative_eq!(interp(-1.0, &xp, &fp), 0.0);
        assert_relative_eq!(interp(5.0, &xp, &fp), 30.0);
    }

    #[test]
    fn test_fill_gaps() {
        let times = [0.0, 1.0, 2.0, 4.0, 5.0];
        let values = [f64::NAN, 1.0, f64::NAN, 4.0, f64::NAN];

        let filled = fill_gaps(&times, &values);
        assert_relative_eq!(filled[0], 1.0);
        assert_relative_eq!(filled[2], 2.0);
        assert_relative_eq!(filled[4], 4.0);
    }

    #[test]
    fn test_fill_gaps_all_missing() {
        let filled = fill_gaps(&[0.0, 1.0], &[f64::NAN, f64::NAN]);
        assert!(filled.iter().all(|v| v.is_nan()));
    }
}
