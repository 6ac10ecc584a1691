//! Small numeric helpers shared across modules.

use std::ops::Range;

/// Returns the index of the first maximum, ignoring NaN samples.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Evenly spaced samples over `[start, stop)` with the endpoint excluded.
pub(crate) fn linspace_open(start: f64, stop: f64, n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let step = (stop - start) / n as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Splits `0..len` into `parts` contiguous ranges whose sizes differ by at most one.
///
/// The first `len % parts` ranges receive the extra element.
pub(crate) fn split_ranges(len: usize, parts: usize) -> Vec<Range<usize>> {
    if parts == 0 {
        return Vec::new();
    }
    let base = len / parts;
    let extra = len % parts;
    let mut out = Vec::with_capacity(parts);
    let mut start = 0usize;
    for part in 0..parts {
        let size = base + usize::from(part < extra);
        out.push(start..start + size);
        start += size;
    }
    out
}

/// Element-wise closeness with `|a - b| <= atol + rtol * |b|`.
pub(crate) fn allclose(a: &[f64], b: &[f64], rtol: f64, atol: f64) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(&x, &y)| (x - y).abs() <= atol + rtol * y.abs())
}
