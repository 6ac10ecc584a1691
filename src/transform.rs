//! Transform entry points: operator application and method dispatch.
//!
//! Images are right-side half images (or quadrants): column 0 lies on the
//! symmetry axis and columns index radius. Each row is transformed
//! independently.

use crate::basis::{BasisCache, Direction, Method, Operator};
use crate::image::{Image, ImageView};
use crate::trace::trace_span;
use crate::util::{AbelError, AbelResult};

#[cfg(not(feature = "simd"))]
use crate::kernel::scalar::DotScalar as Dot;
#[cfg(feature = "simd")]
use crate::kernel::simd::DotSimd as Dot;

/// Options shared by all transform calls.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransformOptions {
    /// Grid spacing. Inverse results are divided by `dr`, forward results
    /// multiplied by it.
    pub dr: f64,
    /// Contract rows in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            dr: 1.0,
            parallel: false,
        }
    }
}

/// Applies `op` to every row of `image`: `out[r, :] = image[r, :] · opᵀ / dr`.
pub fn apply_operator(
    image: ImageView<'_, f64>,
    op: &Operator,
    opts: TransformOptions,
) -> AbelResult<Image> {
    if image.width() != op.size() {
        return Err(AbelError::ShapeMismatch {
            expected: op.size(),
            got: image.width(),
            context: "image columns vs operator size",
        });
    }
    if !opts.dr.is_finite() || opts.dr <= 0.0 {
        return Err(AbelError::InvalidInput("dr must be finite and > 0"));
    }

    let _span = trace_span!("apply_operator", rows = image.height(), cols = image.width()).entered();
    let mut out = Image::zeros(image.width(), image.height())?;
    apply_rows_dispatch(image, op, &mut out, opts.parallel);
    if opts.dr != 1.0 {
        let inv = 1.0 / opts.dr;
        out.data_mut().iter_mut().for_each(|v| *v *= inv);
    }
    Ok(out)
}

#[cfg(feature = "rayon")]
fn apply_rows_dispatch(image: ImageView<'_, f64>, op: &Operator, out: &mut Image, parallel: bool) {
    if parallel {
        crate::kernel::rayon::apply_rows_par::<Dot>(image, op, out);
    } else {
        crate::kernel::apply_rows::<Dot>(image, op, out);
    }
}

#[cfg(not(feature = "rayon"))]
fn apply_rows_dispatch(image: ImageView<'_, f64>, op: &Operator, out: &mut Image, _parallel: bool) {
    crate::kernel::apply_rows::<Dot>(image, op, out);
}

/// Applies `op` to a single radial profile; a 1D input gives a 1D output.
pub fn apply_operator_profile(
    profile: &[f64],
    op: &Operator,
    opts: TransformOptions,
) -> AbelResult<Vec<f64>> {
    let view = ImageView::from_slice(profile, profile.len(), 1)?;
    Ok(apply_operator(view, op, opts)?.into_data())
}

/// Transforms every row of `image` with `method` in `direction`.
///
/// The capability table is consulted before any work; the operator is taken
/// from `cache` (built on a miss).
pub fn transform(
    image: ImageView<'_, f64>,
    method: Method,
    direction: Direction,
    cache: &mut BasisCache,
    opts: TransformOptions,
) -> AbelResult<Image> {
    method.check_direction(direction)?;
    let op = cache.get_or_build(method, direction, image.width())?;
    apply_operator(image, &op, scaled_for(direction, opts))
}

/// Transforms a single radial profile with `method` in `direction`.
pub fn transform_profile(
    profile: &[f64],
    method: Method,
    direction: Direction,
    cache: &mut BasisCache,
    opts: TransformOptions,
) -> AbelResult<Vec<f64>> {
    method.check_direction(direction)?;
    let op = cache.get_or_build(method, direction, profile.len())?;
    apply_operator_profile(profile, &op, scaled_for(direction, opts))
}

/// Operators act on unit-spaced grids; a forward projection scales with `dr`.
fn scaled_for(direction: Direction, opts: TransformOptions) -> TransformOptions {
    match direction {
        Direction::Inverse => opts,
        Direction::Forward => TransformOptions {
            dr: 1.0 / opts.dr,
            ..opts
        },
    }
}

/// Two-point inverse transform of a half image, building the operator afresh.
pub fn two_point_transform(image: ImageView<'_, f64>, dr: f64) -> AbelResult<Image> {
    let op = crate::basis::two_point_operator(image.width());
    apply_operator(
        image,
        &op,
        TransformOptions {
            dr,
            ..TransformOptions::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::{apply_operator, apply_operator_profile, transform, TransformOptions};
    use crate::basis::{two_point_operator, BasisCache, Direction, Method};
    use crate::image::Image;
    use crate::util::AbelError;

    #[test]
    fn profile_and_image_paths_agree() {
        let n = 9;
        let op = two_point_operator(n);
        let profile: Vec<f64> = (0..n).map(|k| (-(k as f64) / 3.0).exp()).collect();
        let img = Image::new(profile.repeat(3), n, 3).unwrap();

        let one = apply_operator_profile(&profile, &op, TransformOptions::default()).unwrap();
        let all = apply_operator(img.view(), &op, TransformOptions::default()).unwrap();
        assert_eq!(one.len(), n);
        assert_eq!(all.height(), 3);
        for y in 0..3 {
            assert_eq!(all.row(y).unwrap(), one.as_slice());
        }
    }

    #[test]
    fn dr_divides_result() {
        let op = two_point_operator(4);
        let profile = [4.0, 3.0, 2.0, 1.0];
        let unit = apply_operator_profile(&profile, &op, TransformOptions::default()).unwrap();
        let half = apply_operator_profile(
            &profile,
            &op,
            TransformOptions {
                dr: 0.5,
                ..TransformOptions::default()
            },
        )
        .unwrap();
        for (a, b) in unit.iter().zip(&half) {
            assert!((2.0 * a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn operator_size_must_match_columns() {
        let op = two_point_operator(4);
        let img = Image::zeros(5, 2).unwrap();
        let err = apply_operator(img.view(), &op, TransformOptions::default()).unwrap_err();
        assert!(matches!(err, AbelError::ShapeMismatch { expected: 4, got: 5, .. }));
    }

    #[test]
    fn forward_two_point_fails_without_building() {
        let mut cache = BasisCache::new();
        let img = Image::zeros(6, 3).unwrap();
        let err = transform(
            img.view(),
            Method::TwoPoint,
            Direction::Forward,
            &mut cache,
            TransformOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AbelError::UnsupportedDirection { .. }));
        assert!(cache.is_empty());
    }
}
