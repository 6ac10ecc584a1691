//! Dasch two-point deconvolution operator.
//!
//! The projection is approximated as piecewise linear between adjacent radial
//! samples, which yields the closed-form basis `J(i, j)` of
//! Dasch, Applied Optics 31, 1146 (1992), sect. C.

use crate::basis::Operator;
use std::f64::consts::PI;

/// Cumulative basis for shell `j` seen from radius `i`, valid for `j >= i`
/// except `i == j == 0`.
fn basis_j(i: usize, j: usize) -> f64 {
    let (fi, fj) = (i as f64, j as f64);
    let outer = ((fj + 1.0).powi(2) - fi * fi).sqrt() + fj + 1.0;
    let inner = (fj * fj - fi * fi).sqrt() + fj;
    (outer / inner).ln() / PI
}

/// Builds the `cols x cols` two-point inverse operator.
///
/// Entries below the diagonal are zero: the value at radius `i` depends only
/// on projections at radii `j >= i`.
pub fn two_point_operator(cols: usize) -> Operator {
    let mut data = vec![0.0; cols * cols];
    for i in 0..cols {
        for j in i..cols {
            data[i * cols + j] = match (i, j) {
                (0, 0) => 2.0 / PI,
                (0, 1) => basis_j(0, 1) - 2.0 / PI,
                _ if i == j => basis_j(i, i),
                _ => basis_j(i, j) - basis_j(i, j - 1),
            };
        }
    }
    Operator::from_vec(cols, data)
}
