//! Scalar reference row kernel.

use crate::basis::Operator;
use crate::kernel::RowKernel;

/// Plain dot-product kernel.
pub struct DotScalar;

impl RowKernel for DotScalar {
    fn apply_row(row: &[f64], op: &Operator, out: &mut [f64]) {
        debug_assert_eq!(row.len(), op.size());
        debug_assert_eq!(out.len(), op.size());
        for (i, value) in out.iter_mut().enumerate() {
            *value = row
                .iter()
                .zip(op.row(i))
                .map(|(&a, &b)| a * b)
                .sum();
        }
    }
}
