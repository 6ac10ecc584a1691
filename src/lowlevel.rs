//! Low-level building blocks for custom reconstruction pipelines.
//!
//! These expose operator construction, row kernels, the alignment fold and
//! the fitting primitives beyond the high-level `transform` and
//! `circularize_image` entry points. Most users should prefer the top-level
//! API.

pub use crate::basis::{
    build_operator, onion_peeling_forward_operator, onion_peeling_inverse_operator,
    two_point_operator,
};
pub use crate::circularize::align::{align, angular_slices, lsq_step, AngularSlice, LsqState};
pub use crate::circularize::remap::{remap, remap_with_zoom};
pub use crate::fit::quad1d::{parabolic_peak_offset, refine_peak};
pub use crate::fit::{optimize, CubicSpline, LeastSquaresProblem, LmConfig, LmResult};
pub use crate::image::sample::sample;
pub use crate::image::zoom::{zoom, zoom_to};
pub use crate::kernel::scalar::DotScalar;
pub use crate::kernel::RowKernel;
pub use crate::transform::{apply_operator, apply_operator_profile, two_point_transform};
