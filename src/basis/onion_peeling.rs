//! Dasch onion-peeling operators.
//!
//! The distribution is taken as constant over each annulus
//! `[j - 1/2, j + 1/2)`. `W[i, j]` is the chord length of annulus `j` along
//! the line of sight at height `i`, so `W` is the forward projection and its
//! inverse is the deconvolution operator.

use crate::basis::Operator;
use crate::util::{AbelError, AbelResult};
use nalgebra::DMatrix;

fn chord_weight(i: usize, j: usize) -> f64 {
    let (fi, fj) = (i as f64, j as f64);
    let outer = ((2.0 * fj + 1.0).powi(2) - 4.0 * fi * fi).sqrt();
    if i == j {
        outer
    } else {
        outer - ((2.0 * fj - 1.0).powi(2) - 4.0 * fi * fi).sqrt()
    }
}

/// Builds the forward projection operator `W`.
pub fn onion_peeling_forward_operator(cols: usize) -> Operator {
    let mut data = vec![0.0; cols * cols];
    for i in 0..cols {
        for j in i..cols {
            data[i * cols + j] = chord_weight(i, j);
        }
    }
    Operator::from_vec(cols, data)
}

/// Builds the inverse operator `W⁻¹` by upper-triangular solve.
pub fn onion_peeling_inverse_operator(cols: usize) -> AbelResult<Operator> {
    let forward = onion_peeling_forward_operator(cols);
    let w = DMatrix::from_row_slice(cols, cols, forward.as_slice());
    let inv = w
        .solve_upper_triangular(&DMatrix::identity(cols, cols))
        .ok_or(AbelError::InvalidInput("onion-peeling weights are singular"))?;
    let mut data = vec![0.0; cols * cols];
    for i in 0..cols {
        for j in i..cols {
            data[i * cols + j] = inv[(i, j)];
        }
    }
    Ok(Operator::from_vec(cols, data))
}
