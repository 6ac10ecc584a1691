//! Three-point parabolic peak refinement.

/// Returns the vertex offset of the parabola through `(-1, fm)`, `(0, f0)`,
/// `(1, fp)`.
///
/// `None` when the samples are not finite, the parabola opens upward or is
/// flat, or the vertex falls outside `[-1, 1]`.
pub fn parabolic_peak_offset(fm: f64, f0: f64, fp: f64) -> Option<f64> {
    if !(fm.is_finite() && f0.is_finite() && fp.is_finite()) {
        return None;
    }
    let curvature = fm - 2.0 * f0 + fp;
    if curvature >= -1e-12 {
        return None;
    }
    let dx = 0.5 * (fm - fp) / curvature;
    (dx.is_finite() && dx.abs() <= 1.0).then_some(dx)
}

/// Sub-sample position of the maximum of `values` around index `peak`.
///
/// Falls back to the integer index at the borders or when the fit fails.
pub fn refine_peak(values: &[f64], peak: usize) -> f64 {
    if peak == 0 || peak + 1 >= values.len() {
        return peak as f64;
    }
    let offset = parabolic_peak_offset(values[peak - 1], values[peak], values[peak + 1]);
    peak as f64 + offset.unwrap_or(0.0)
}
