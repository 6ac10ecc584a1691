//! Angular correction function and inverse-mapping image remap.

use crate::fit::CubicSpline;
use crate::image::sample::{sample, Interpolation};
use crate::image::zoom::{zoom, zoom_to};
use crate::image::{Image, ImageView};
use crate::polar::origin;
use crate::trace::trace_span;
use crate::util::{AbelError, AbelResult};

/// Radial scale as a function of polar angle.
///
/// Angles follow the polar reprojection convention, `atan2(x, y_up)`.
pub trait RadialCorrection: Sync {
    fn scale_at(&self, theta: f64) -> f64;
}

impl<F> RadialCorrection for F
where
    F: Fn(f64) -> f64 + Sync,
{
    fn scale_at(&self, theta: f64) -> f64 {
        self(theta)
    }
}

/// Constant correction; `1.0` is the identity.
impl RadialCorrection for f64 {
    fn scale_at(&self, _theta: f64) -> f64 {
        *self
    }
}

/// Smoothing spline through per-slice `(angle, scale)` pairs.
///
/// Outside the fitted angle range the boundary value is returned.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrectionFn {
    spline: CubicSpline,
}

impl CorrectionFn {
    /// Fits the correction; `smoothing = 0` interpolates every factor.
    pub fn fit(angles: &[f64], factors: &[f64], smoothing: f64) -> AbelResult<Self> {
        let spline = CubicSpline::smoothing(angles, factors, smoothing)?;
        Ok(Self { spline })
    }

    /// Evaluates the correction at `theta`.
    pub fn eval(&self, theta: f64) -> f64 {
        self.spline.eval(theta)
    }

    /// Angles the correction was fitted on.
    pub fn angles(&self) -> &[f64] {
        self.spline.knots()
    }

    /// Smoothed factors at the fitted angles.
    pub fn values(&self) -> &[f64] {
        self.spline.values()
    }
}

impl RadialCorrection for CorrectionFn {
    fn scale_at(&self, theta: f64) -> f64 {
        self.eval(theta)
    }
}

fn remap_row<C: RadialCorrection + ?Sized>(
    src: ImageView<'_, f64>,
    correction: &C,
    interpolation: Interpolation,
    row: usize,
    dst: &mut [f64],
) {
    let (ox, oy) = origin(src.width(), src.height());
    let y = oy - row as f64;
    for (col, value) in dst.iter_mut().enumerate() {
        let x = col as f64 - ox;
        let scale = correction.scale_at(x.atan2(y));
        *value = if scale.is_finite() && scale > 0.0 {
            sample(src, ox + x / scale, oy - y / scale, interpolation)
        } else {
            0.0
        };
    }
}

/// Resamples `src` so that the pixel at polar `(r, θ)` takes the value found
/// at `(r / c(θ), θ)` in the input.
///
/// Output has the input's shape; source positions outside the image read 0.
pub fn remap<C: RadialCorrection + ?Sized>(
    src: ImageView<'_, f64>,
    correction: &C,
    interpolation: Interpolation,
    parallel: bool,
) -> AbelResult<Image> {
    let _span = trace_span!("remap", width = src.width(), height = src.height()).entered();
    let mut out = Image::zeros(src.width(), src.height())?;
    remap_rows(src, correction, interpolation, &mut out, parallel);
    Ok(out)
}

#[cfg(feature = "rayon")]
fn remap_rows<C: RadialCorrection + ?Sized>(
    src: ImageView<'_, f64>,
    correction: &C,
    interpolation: Interpolation,
    out: &mut Image,
    parallel: bool,
) {
    use rayon::prelude::*;
    let width = out.width();
    if parallel {
        out.data_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, dst)| remap_row(src, correction, interpolation, row, dst));
    } else {
        for (row, dst) in out.data_mut().chunks_mut(width).enumerate() {
            remap_row(src, correction, interpolation, row, dst);
        }
    }
}

#[cfg(not(feature = "rayon"))]
fn remap_rows<C: RadialCorrection + ?Sized>(
    src: ImageView<'_, f64>,
    correction: &C,
    interpolation: Interpolation,
    out: &mut Image,
    _parallel: bool,
) {
    let width = out.width();
    for (row, dst) in out.data_mut().chunks_mut(width).enumerate() {
        remap_row(src, correction, interpolation, row, dst);
    }
}

/// Upsamples by `factor`, remaps, and resamples back to the input shape.
pub fn remap_with_zoom<C: RadialCorrection + ?Sized>(
    src: ImageView<'_, f64>,
    correction: &C,
    factor: f64,
    interpolation: Interpolation,
    parallel: bool,
) -> AbelResult<Image> {
    if !factor.is_finite() || factor < 1.0 {
        return Err(AbelError::InvalidInput("zoom must be finite and >= 1"));
    }
    if factor == 1.0 {
        return remap(src, correction, interpolation, parallel);
    }
    let zoomed = zoom(src, factor, interpolation)?;
    let corrected = remap(zoomed.view(), correction, interpolation, parallel)?;
    zoom_to(corrected.view(), src.width(), src.height(), interpolation)
}
