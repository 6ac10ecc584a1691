//! abelkit reconstructs radial distributions from planar projections with
//! matrix-form Abel transforms, and corrects radial distortion in the
//! projection images ("circularization") before reconstruction.
//!
//! Transforms operate on right-half images whose column 0 is the symmetry
//! axis. Operators are cached by the caller through [`BasisCache`]. Row
//! contraction can run in parallel via the `rayon` feature and with a
//! 4-lane SIMD dot product via the `simd` feature.

pub mod analytical;
pub mod basis;
pub mod benchmark;
pub mod center;
pub mod circularize;
pub mod fit;
pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod polar;
pub mod symmetry;
mod trace;
pub mod transform;
pub mod util;

pub use basis::{BasisCache, Direction, Method, Operator};
pub use center::{center_image, CenterMethod};
pub use circularize::{
    circularize_image, circularize_image_with_correction, AlignMethod, Circularization,
    CircularizeConfig, CorrectionFn, RadialCorrection,
};
pub use image::sample::Interpolation;
pub use image::{Image, ImageView};
pub use polar::{reproject_image_into_polar, PolarImage};
pub use transform::{transform, transform_profile, TransformOptions};
pub use util::{AbelError, AbelResult};
