//! Rayon-parallel row application (feature-gated).
//!
//! Rows are independent, so each worker contracts a disjoint set of output
//! rows with the shared operator.

use crate::basis::Operator;
use crate::image::{Image, ImageView};
use crate::kernel::RowKernel;
use rayon::prelude::*;

/// Row-parallel version of the sequential row loop.
pub(crate) fn apply_rows_par<K: RowKernel>(
    image: ImageView<'_, f64>,
    op: &Operator,
    out: &mut Image,
) {
    debug_assert_eq!(image.width(), op.size());
    let width = out.width();
    out.data_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, dst)| {
            if let Some(row) = image.row(y) {
                K::apply_row(row, op, dst);
            }
        });
}
