//! Circularization: radial distortion correction from angular slice alignment.
//!
//! The image is reprojected into polar coordinates and split into angular
//! slices. Each slice's radial profile is compared against a reference to get
//! a scale factor, a smoothing spline through those factors gives the
//! correction `c(θ)`, and the image is remapped so that radius `r` at angle
//! `θ` reads from radius `r / c(θ)`.

pub mod align;
pub mod remap;

pub use align::{align, angular_slices, lsq_step, AlignMethod, AngularSlice, LsqState};
pub use remap::{remap, remap_with_zoom, CorrectionFn, RadialCorrection};

use crate::basis::{BasisCache, Direction, Method};
use crate::center::{center_image, CenterMethod};
use crate::fit::LmConfig;
use crate::image::sample::Interpolation;
use crate::image::zoom::{zoom, zoom_to};
use crate::image::{Image, ImageView};
use crate::polar::{reproject_image_into_polar, PolarImage};
use crate::trace::{trace_event, trace_span};
use crate::transform::{transform, TransformOptions};
use crate::util::{AbelError, AbelResult};

/// Parameters of a circularization run.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CircularizeConfig {
    /// Slice alignment strategy.
    pub method: AlignMethod,
    /// Optional re-centering before the polar reprojection.
    pub center: Option<CenterMethod>,
    /// Keep only radii strictly inside `(rmin, rmax)`, in input pixels.
    pub radial_range: Option<(f64, f64)>,
    /// Upsampling factor applied before the analysis, `>= 1`.
    pub zoom: f64,
    /// Smoothing budget of the correction spline; 0 interpolates.
    pub smooth: f64,
    /// Number of angular slices.
    pub nslices: usize,
    /// Inverse-Abel transform the polar image along radius before slicing.
    pub inverse: bool,
    /// Kernel for every resampling step.
    pub interpolation: Interpolation,
    /// Remap rows and argmax slices in parallel (requires `rayon`).
    pub parallel: bool,
    /// Solver settings for `AlignMethod::Lsq`.
    pub lm: LmConfig,
}

impl Default for CircularizeConfig {
    fn default() -> Self {
        Self {
            method: AlignMethod::Argmax,
            center: None,
            radial_range: None,
            zoom: 1.0,
            smooth: 1.0e-7,
            nslices: 32,
            inverse: false,
            interpolation: Interpolation::Bicubic,
            parallel: false,
            lm: LmConfig::default(),
        }
    }
}

impl CircularizeConfig {
    fn validate(&self, width: usize, height: usize) -> AbelResult<()> {
        if width == 0 || height == 0 {
            return Err(AbelError::InvalidDimensions { width, height });
        }
        if !self.zoom.is_finite() || self.zoom < 1.0 {
            return Err(AbelError::InvalidInput("zoom must be finite and >= 1"));
        }
        if !self.smooth.is_finite() || self.smooth < 0.0 {
            return Err(AbelError::InvalidInput("smooth must be finite and >= 0"));
        }
        let (zw, zh) = zoomed_shape(width, height, self.zoom);
        if self.nslices == 0 || self.nslices > zw.max(zh) {
            return Err(AbelError::InvalidInput(
                "nslices must be in 1..=max(rows, cols)",
            ));
        }
        if let Some((rmin, rmax)) = self.radial_range {
            if !(rmin.is_finite() && rmax.is_finite() && rmin < rmax) {
                return Err(AbelError::InvalidInput("radial_range must satisfy rmin < rmax"));
            }
        }
        Ok(())
    }
}

/// Corrected image plus the intermediate quantities of the run.
#[derive(Clone, Debug)]
pub struct Circularization {
    /// Corrected image, same shape as the input.
    pub image: Image,
    /// Mean angle of each slice.
    pub slice_angles: Vec<f64>,
    /// Raw per-slice scale factors, same order as `slice_angles`.
    pub radial_corrections: Vec<f64>,
    /// Smoothed correction fitted to `radial_corrections`.
    pub correction: CorrectionFn,
}

fn zoomed_shape(width: usize, height: usize, factor: f64) -> (usize, usize) {
    if factor == 1.0 {
        return (width, height);
    }
    (
        ((width as f64 * factor).round() as usize).max(1),
        ((height as f64 * factor).round() as usize).max(1),
    )
}

/// Corrects radial distortion of `src`; returns only the image.
pub fn circularize_image(src: ImageView<'_, f64>, cfg: &CircularizeConfig) -> AbelResult<Image> {
    circularize_image_with_correction(src, cfg).map(|run| run.image)
}

/// Corrects radial distortion of `src` and reports the fitted correction.
pub fn circularize_image_with_correction(
    src: ImageView<'_, f64>,
    cfg: &CircularizeConfig,
) -> AbelResult<Circularization> {
    cfg.validate(src.width(), src.height())?;
    let _span = trace_span!(
        "circularize",
        width = src.width(),
        height = src.height(),
        method = cfg.method.name(),
        nslices = cfg.nslices
    )
    .entered();

    let mut work = if cfg.zoom > 1.0 {
        zoom(src, cfg.zoom, cfg.interpolation)?
    } else {
        Image::from_view(src)?
    };
    if let Some(method) = cfg.center {
        work = center_image(work.view(), method)?;
    }

    let mut polar = reproject_image_into_polar(work.view(), 1.0, cfg.interpolation)?;
    if cfg.inverse {
        polar = inverse_along_radius(polar)?;
    }
    if let Some((rmin, rmax)) = cfg.radial_range {
        polar = polar.crop_radial(rmin * cfg.zoom, rmax * cfg.zoom)?;
    }

    let slices = angular_slices(&polar, cfg.nslices)?;
    let slice_angles: Vec<f64> = slices.iter().map(|s| s.angle).collect();
    let radial_corrections = align(&slices, polar.radial(), cfg.method, &cfg.lm, cfg.parallel)?;
    let correction = CorrectionFn::fit(&slice_angles, &radial_corrections, cfg.smooth)?;
    trace_event!(
        "correction_fitted",
        slices = slice_angles.len(),
        radial_rows = polar.radial().len()
    );

    let corrected = remap(work.view(), &correction, cfg.interpolation, cfg.parallel)?;
    let image = if corrected.width() != src.width() || corrected.height() != src.height() {
        zoom_to(corrected.view(), src.width(), src.height(), cfg.interpolation)?
    } else {
        corrected
    };

    Ok(Circularization {
        image,
        slice_angles,
        radial_corrections,
        correction,
    })
}

/// Two-point inverse of every angle column of `polar`, treating the radius
/// axis as the half-image radius.
fn inverse_along_radius(polar: PolarImage) -> AbelResult<PolarImage> {
    let mut cache = BasisCache::new();
    let by_angle = polar.image().transpose();
    let inverted = transform(
        by_angle.view(),
        Method::TwoPoint,
        Direction::Inverse,
        &mut cache,
        TransformOptions::default(),
    )?;
    polar.with_image(inverted.transpose())
}

#[cfg(test)]
mod tests {
    use super::{circularize_image, circularize_image_with_correction, CircularizeConfig};
    use crate::image::Image;
    use crate::util::AbelError;

    fn ring(size: usize, radius: f64) -> Image {
        let c = (size / 2) as f64;
        Image::from_fn(size, size, |x, y| {
            let r = ((x as f64 - c).powi(2) + (y as f64 - c).powi(2)).sqrt();
            (-(r - radius).powi(2) / 8.0).exp()
        })
        .unwrap()
    }

    #[test]
    fn round_image_gets_unit_corrections() {
        let img = ring(81, 25.0);
        let cfg = CircularizeConfig {
            nslices: 16,
            ..CircularizeConfig::default()
        };
        let run = circularize_image_with_correction(img.view(), &cfg).unwrap();
        assert_eq!(run.slice_angles.len(), 16);
        assert_eq!(run.radial_corrections[0], 1.0);
        for &f in &run.radial_corrections {
            assert!((f - 1.0).abs() < 0.05, "{f}");
        }
        assert_eq!((run.image.width(), run.image.height()), (81, 81));
    }

    #[test]
    fn invalid_configuration_fails_before_work() {
        let img = ring(21, 5.0);
        let bad = [
            CircularizeConfig {
                nslices: 0,
                ..CircularizeConfig::default()
            },
            CircularizeConfig {
                nslices: 22,
                ..CircularizeConfig::default()
            },
            CircularizeConfig {
                zoom: 0.5,
                ..CircularizeConfig::default()
            },
            CircularizeConfig {
                smooth: -1.0,
                ..CircularizeConfig::default()
            },
            CircularizeConfig {
                radial_range: Some((5.0, 2.0)),
                ..CircularizeConfig::default()
            },
        ];
        for cfg in bad {
            let err = circularize_image(img.view(), &cfg).unwrap_err();
            assert!(matches!(err, AbelError::InvalidInput(_)), "{err:?}");
        }
    }

    #[test]
    fn zoomed_run_returns_original_shape() {
        let img = ring(41, 12.0);
        let cfg = CircularizeConfig {
            zoom: 2.0,
            nslices: 8,
            radial_range: Some((5.0, 18.0)),
            ..CircularizeConfig::default()
        };
        let out = circularize_image(img.view(), &cfg).unwrap();
        assert_eq!((out.width(), out.height()), (41, 41));
    }

    #[test]
    fn inverse_conditioning_runs() {
        let img = ring(41, 12.0);
        let cfg = CircularizeConfig {
            inverse: true,
            nslices: 8,
            ..CircularizeConfig::default()
        };
        let run = circularize_image_with_correction(img.view(), &cfg).unwrap();
        assert_eq!(run.radial_corrections.len(), 8);
        assert!(run.radial_corrections.iter().all(|f| f.is_finite() && *f > 0.0));
    }
}
