//! Cartesian to polar reprojection.
//!
//! The origin is pixel `(cols / 2, rows / 2)`. With `x = col - ox` and
//! `y = oy - row` (positive upward), the polar angle is `atan2(x, y)`, i.e.
//! measured from the upward vertical towards +x. The image remapper in
//! [`crate::circularize`] uses the same convention.

use crate::image::sample::{sample, Interpolation};
use crate::image::{Image, ImageView};
use crate::util::math::linspace_open;
use crate::util::{AbelError, AbelResult};

/// Image resampled on a regular `(radius, angle)` grid.
///
/// Row `i` holds radius `radial[i]`, column `j` holds angle `angles[j]`.
#[derive(Clone, Debug)]
pub struct PolarImage {
    image: Image,
    radial: Vec<f64>,
    angles: Vec<f64>,
}

impl PolarImage {
    /// Assembles a polar image from its grid and coordinates.
    pub fn new(image: Image, radial: Vec<f64>, angles: Vec<f64>) -> AbelResult<Self> {
        if radial.len() != image.height() {
            return Err(AbelError::ShapeMismatch {
                expected: image.height(),
                got: radial.len(),
                context: "polar radial coordinates",
            });
        }
        if angles.len() != image.width() {
            return Err(AbelError::ShapeMismatch {
                expected: image.width(),
                got: angles.len(),
                context: "polar angle coordinates",
            });
        }
        Ok(Self {
            image,
            radial,
            angles,
        })
    }

    /// Polar samples, rows = radius, columns = angle.
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Radius of each row.
    pub fn radial(&self) -> &[f64] {
        &self.radial
    }

    /// Angle (radians) of each column.
    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    /// Replaces the samples, keeping the coordinates.
    pub fn with_image(self, image: Image) -> AbelResult<Self> {
        Self::new(image, self.radial, self.angles)
    }

    /// Keeps only rows with `rmin < radius < rmax`.
    pub fn crop_radial(&self, rmin: f64, rmax: f64) -> AbelResult<Self> {
        let first = self.radial.iter().position(|&r| r > rmin && r < rmax);
        let Some(first) = first else {
            return Err(AbelError::InvalidInput("radial range selects no polar rows"));
        };
        let count = self.radial[first..]
            .iter()
            .take_while(|&&r| r > rmin && r < rmax)
            .count();
        let roi = self
            .image
            .view()
            .roi(0, first, self.image.width(), count)?;
        Self::new(
            Image::from_view(roi)?,
            self.radial[first..first + count].to_vec(),
            self.angles.clone(),
        )
    }
}

/// Resamples `src` onto a polar grid with radial spacing `dr`.
///
/// Radii run from the smallest to the largest pixel distance to the origin
/// (endpoint excluded) in `ceil((rmax - rmin) / dr)` steps; angles span the
/// observed pixel angles in `max(rows, cols)` steps (endpoint excluded).
pub fn reproject_image_into_polar(
    src: ImageView<'_, f64>,
    dr: f64,
    interpolation: Interpolation,
) -> AbelResult<PolarImage> {
    if !dr.is_finite() || dr <= 0.0 {
        return Err(AbelError::InvalidInput("dr must be finite and > 0"));
    }
    let (ox, oy) = origin(src.width(), src.height());

    let mut r_min = f64::INFINITY;
    let mut r_max = f64::NEG_INFINITY;
    let mut t_min = f64::INFINITY;
    let mut t_max = f64::NEG_INFINITY;
    for row in 0..src.height() {
        for col in 0..src.width() {
            let x = col as f64 - ox;
            let y = oy - row as f64;
            let r = x.hypot(y);
            let t = x.atan2(y);
            r_min = r_min.min(r);
            r_max = r_max.max(r);
            t_min = t_min.min(t);
            t_max = t_max.max(t);
        }
    }

    let nr = (((r_max - r_min) / dr).ceil() as usize).max(1);
    let nt = src.width().max(src.height());
    let radial = linspace_open(r_min, r_max, nr);
    let angles = linspace_open(t_min, t_max, nt);

    let mut out = Image::zeros(nt, nr)?;
    for (i, &r) in radial.iter().enumerate() {
        let Some(dst) = out.row_mut(i) else { continue };
        for (value, &t) in dst.iter_mut().zip(&angles) {
            let (sin, cos) = t.sin_cos();
            *value = sample(src, ox + r * sin, oy - r * cos, interpolation);
        }
    }
    PolarImage::new(out, radial, angles)
}

/// Geometric centre `(cols / 2, rows / 2)` with integer division.
pub(crate) fn origin(width: usize, height: usize) -> (f64, f64) {
    ((width / 2) as f64, (height / 2) as f64)
}
