//! SIMD row kernel using the `wide` crate.
//!
//! The dot product is accumulated four lanes at a time in `f64x4`; the tail
//! shorter than one vector is summed in scalar code.

use crate::basis::Operator;
use crate::kernel::RowKernel;
use wide::f64x4;

const LANES: usize = 4;

#[inline]
fn load_f64x4(slice: &[f64]) -> f64x4 {
    f64x4::from([slice[0], slice[1], slice[2], slice[3]])
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    let chunks = a.len() / LANES;
    let mut acc = f64x4::ZERO;
    for c in 0..chunks {
        let base = c * LANES;
        acc += load_f64x4(&a[base..]) * load_f64x4(&b[base..]);
    }
    let mut sum = acc.reduce_add();
    for k in chunks * LANES..a.len() {
        sum += a[k] * b[k];
    }
    sum
}

/// Vectorized dot-product kernel.
pub struct DotSimd;

impl RowKernel for DotSimd {
    fn apply_row(row: &[f64], op: &Operator, out: &mut [f64]) {
        debug_assert_eq!(row.len(), op.size());
        for (i, value) in out.iter_mut().enumerate() {
            *value = dot(row, op.row(i));
        }
    }
}
