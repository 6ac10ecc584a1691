//! Row kernels for applying a deconvolution operator.
//!
//! A kernel contracts one image row with every row of the operator,
//! `out[i] = Σ_j row[j] · D[i, j]`.

use crate::basis::Operator;
use crate::image::{Image, ImageView};

/// Kernel trait for the per-row operator contraction.
pub trait RowKernel {
    /// Writes `row · Dᵀ` into `out`; all three lengths equal `op.size()`.
    fn apply_row(row: &[f64], op: &Operator, out: &mut [f64]);
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

/// Applies kernel `K` to every row of `image`, writing into `out`.
pub(crate) fn apply_rows<K: RowKernel>(image: ImageView<'_, f64>, op: &Operator, out: &mut Image) {
    debug_assert_eq!(image.width(), op.size());
    let width = out.width();
    for (row, dst) in image.rows().zip(out.data_mut().chunks_mut(width)) {
        K::apply_row(row, op, dst);
    }
}
