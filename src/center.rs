//! Origin detection and re-centering.
//!
//! Every method estimates the symmetry centre `(x, y)` in pixel coordinates;
//! [`center_image`] then shifts the image so that centre lands on the
//! geometric centre `(cols / 2, rows / 2)` used by the polar reprojection.

use std::fmt;
use std::str::FromStr;

use crate::fit::quad1d::refine_peak;
use crate::fit::{optimize, LeastSquaresProblem, LmConfig};
use crate::image::sample::{sample, Interpolation};
use crate::image::{Image, ImageView};
use crate::polar::origin;
use crate::trace::{trace_event, trace_span};
use crate::util::math::argmax;
use crate::util::{AbelError, AbelResult};

/// Origin-finding strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CenterMethod {
    /// Intensity centroid.
    Com,
    /// Self-convolution peak of each axis projection.
    Convolution,
    /// Gaussian fit of each axis projection.
    Gaussian,
    /// Geometric centre; never shifts.
    ImageCenter,
    /// Self-convolution restricted to a central band.
    Slice,
}

impl CenterMethod {
    pub const ALL: [CenterMethod; 5] = [
        CenterMethod::Com,
        CenterMethod::Convolution,
        CenterMethod::Gaussian,
        CenterMethod::ImageCenter,
        CenterMethod::Slice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CenterMethod::Com => "com",
            CenterMethod::Convolution => "convolution",
            CenterMethod::Gaussian => "gaussian",
            CenterMethod::ImageCenter => "image_center",
            CenterMethod::Slice => "slice",
        }
    }
}

impl fmt::Display for CenterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CenterMethod {
    type Err = AbelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CenterMethod::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| AbelError::InvalidMethod {
                name: s.to_string(),
            })
    }
}

/// Estimates the symmetry centre `(x, y)` of `src`.
pub fn find_origin(src: ImageView<'_, f64>, method: CenterMethod) -> AbelResult<(f64, f64)> {
    if src.width() == 0 || src.height() == 0 {
        return Err(AbelError::InvalidDimensions {
            width: src.width(),
            height: src.height(),
        });
    }
    match method {
        CenterMethod::ImageCenter => Ok(origin(src.width(), src.height())),
        CenterMethod::Com => centroid(src),
        CenterMethod::Convolution => {
            let (px, py) = projections(src);
            Ok((convolution_center(&px), convolution_center(&py)))
        }
        CenterMethod::Gaussian => {
            let (px, py) = projections(src);
            let lm = LmConfig::default();
            Ok((gaussian_center(&px, &lm), gaussian_center(&py, &lm)))
        }
        CenterMethod::Slice => {
            let (ox, oy) = origin(src.width(), src.height());
            let band_x = central_band(src.height(), oy as usize);
            let band_y = central_band(src.width(), ox as usize);
            let px = src.roi(0, band_x.0, src.width(), band_x.1)?;
            let py = src.roi(band_y.0, 0, band_y.1, src.height())?;
            Ok((
                convolution_center(&projections(px).0),
                convolution_center(&projections(py).1),
            ))
        }
    }
}

/// Shifts `src` so its detected origin sits at `(cols / 2, rows / 2)`.
///
/// Shape is preserved; pixels shifted in from outside the image are 0.
pub fn center_image(src: ImageView<'_, f64>, method: CenterMethod) -> AbelResult<Image> {
    let _span = trace_span!("center_image", method = method.name()).entered();
    let (cx, cy) = find_origin(src, method)?;
    let (ox, oy) = origin(src.width(), src.height());
    trace_event!("origin_found", x = cx, y = cy);
    let (dx, dy) = (cx - ox, cy - oy);
    if dx == 0.0 && dy == 0.0 {
        return Image::from_view(src);
    }
    Image::from_fn(src.width(), src.height(), |x, y| {
        sample(src, x as f64 + dx, y as f64 + dy, Interpolation::Bicubic)
    })
}

/// Column sums (indexed by x) and row sums (indexed by y).
fn projections(src: ImageView<'_, f64>) -> (Vec<f64>, Vec<f64>) {
    let mut px = vec![0.0; src.width()];
    let mut py = Vec::with_capacity(src.height());
    for row in src.rows() {
        let mut total = 0.0;
        for (acc, &v) in px.iter_mut().zip(row) {
            *acc += v;
            total += v;
        }
        py.push(total);
    }
    (px, py)
}

fn centroid(src: ImageView<'_, f64>) -> AbelResult<(f64, f64)> {
    let (px, py) = projections(src);
    let total: f64 = px.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return Err(AbelError::InvalidInput("image intensity must have a finite non-zero sum"));
    }
    let moment = |p: &[f64]| p.iter().enumerate().map(|(i, &v)| i as f64 * v).sum::<f64>();
    Ok((moment(&px) / total, moment(&py) / total))
}

/// `(start, len)` of the central eighth-height band around `centre`.
fn central_band(len: usize, centre: usize) -> (usize, usize) {
    let half = (len / 8).max(1);
    let start = centre.saturating_sub(half);
    let end = (centre + half + 1).min(len);
    (start, end - start)
}

/// Half the refined peak position of `p * p`.
fn convolution_center(p: &[f64]) -> f64 {
    let n = p.len();
    let mut conv = vec![0.0; 2 * n - 1];
    for (i, &a) in p.iter().enumerate() {
        for (j, &b) in p.iter().enumerate() {
            conv[i + j] += a * b;
        }
    }
    match argmax(&conv) {
        Some(peak) => refine_peak(&conv, peak) / 2.0,
        None => (n / 2) as f64,
    }
}

struct GaussianProfile<'a> {
    values: &'a [f64],
}

impl LeastSquaresProblem<4> for GaussianProfile<'_> {
    fn residuals(&self, p: &[f64; 4], out: &mut Vec<f64>) {
        let [amplitude, centre, sigma, offset] = *p;
        out.clear();
        out.extend(self.values.iter().enumerate().map(|(i, &v)| {
            let d = i as f64 - centre;
            amplitude * (-d * d / (2.0 * sigma * sigma)).exp() + offset - v
        }));
    }

    fn constrain(&self, p: &mut [f64; 4]) {
        p[2] = p[2].abs().max(1e-3);
    }
}

fn gaussian_center(p: &[f64], lm: &LmConfig) -> f64 {
    let Some(peak) = argmax(p) else {
        return (p.len() / 2) as f64;
    };
    let min = p.iter().copied().fold(f64::INFINITY, f64::min);
    let initial = [p[peak] - min, peak as f64, (p.len() as f64 / 8.0).max(1.0), min];
    let fit = optimize(&GaussianProfile { values: p }, initial, lm);
    let centre = fit.params[1];
    if centre.is_finite() && (0.0..=(p.len() - 1) as f64).contains(&centre) {
        centre
    } else {
        peak as f64
    }
}

#[cfg(test)]
mod tests {
    use super::{center_image, find_origin, CenterMethod};
    use crate::image::Image;
    use crate::util::AbelError;

    fn blob_at(cx: f64, cy: f64) -> Image {
        Image::from_fn(41, 41, |x, y| {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            (-(dx * dx + dy * dy) / 18.0).exp()
        })
        .unwrap()
    }

    #[test]
    fn parses_names() {
        for method in CenterMethod::ALL {
            assert_eq!(method.name().parse::<CenterMethod>().unwrap(), method);
        }
        assert!(matches!(
            "middle".parse::<CenterMethod>(),
            Err(AbelError::InvalidMethod { .. })
        ));
    }

    #[test]
    fn every_method_locates_offset_blob() {
        let img = blob_at(23.0, 18.0);
        for method in [
            CenterMethod::Com,
            CenterMethod::Convolution,
            CenterMethod::Gaussian,
            CenterMethod::Slice,
        ] {
            let (x, y) = find_origin(img.view(), method).unwrap();
            assert!((x - 23.0).abs() < 0.25, "{method}: x = {x}");
            assert!((y - 18.0).abs() < 0.25, "{method}: y = {y}");
        }
        assert_eq!(
            find_origin(img.view(), CenterMethod::ImageCenter).unwrap(),
            (20.0, 20.0)
        );
    }

    #[test]
    fn centering_moves_blob_to_geometric_centre() {
        let img = blob_at(23.0, 18.0);
        let centred = center_image(img.view(), CenterMethod::Com).unwrap();
        assert_eq!((centred.width(), centred.height()), (41, 41));
        let (x, y) = find_origin(centred.view(), CenterMethod::Com).unwrap();
        assert!((x - 20.0).abs() < 0.1, "{x}");
        assert!((y - 20.0).abs() < 0.1, "{y}");
    }

    #[test]
    fn image_center_is_a_copy() {
        let img = blob_at(23.0, 18.0);
        let out = center_image(img.view(), CenterMethod::ImageCenter).unwrap();
        assert_eq!(out, img);
    }
}
