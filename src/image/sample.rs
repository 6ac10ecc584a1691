//! Sub-pixel sampling of floating-point images.
//!
//! Coordinates are in pixel units with `(0, 0)` at the centre of the top-left
//! pixel. Samples whose coordinate falls outside `[0, w - 1] x [0, h - 1]`
//! return `0.0`; inside that range, neighbours beyond the edge are clamped to
//! the nearest valid pixel.

use crate::image::ImageView;

const EDGE_EPS: f64 = 1e-9;

/// Interpolation kernel used for resampling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Interpolation {
    /// Four-tap bilinear interpolation.
    Bilinear,
    /// Sixteen-tap Catmull-Rom bicubic interpolation.
    #[default]
    Bicubic,
}

/// Samples `src` at `(x, y)` with the requested kernel.
#[inline]
pub fn sample(src: ImageView<'_, f64>, x: f64, y: f64, interpolation: Interpolation) -> f64 {
    let max_x = src.width() as f64 - 1.0;
    let max_y = src.height() as f64 - 1.0;
    if !x.is_finite()
        || !y.is_finite()
        || x < -EDGE_EPS
        || y < -EDGE_EPS
        || x > max_x + EDGE_EPS
        || y > max_y + EDGE_EPS
    {
        return 0.0;
    }
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);
    match interpolation {
        Interpolation::Bilinear => bilinear(src, x, y),
        Interpolation::Bicubic => bicubic(src, x, y),
    }
}

#[inline]
fn pixel(src: ImageView<'_, f64>, x: isize, y: isize) -> f64 {
    let xi = x.clamp(0, src.width() as isize - 1) as usize;
    let yi = y.clamp(0, src.height() as isize - 1) as usize;
    src.get(xi, yi).copied().unwrap_or(0.0)
}

fn bilinear(src: ImageView<'_, f64>, x: f64, y: f64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as isize, y0 as isize);

    let a = pixel(src, x0, y0);
    let b = pixel(src, x0 + 1, y0);
    let c = pixel(src, x0, y0 + 1);
    let d = pixel(src, x0 + 1, y0 + 1);

    let top = a + fx * (b - a);
    let bottom = c + fx * (d - c);
    top + fy * (bottom - top)
}

/// Catmull-Rom kernel (`a = -0.5`).
#[inline]
fn cubic_weight(t: f64) -> f64 {
    const A: f64 = -0.5;
    let t = t.abs();
    if t <= 1.0 {
        ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((A * t - 5.0 * A) * t + 8.0 * A) * t - 4.0 * A
    } else {
        0.0
    }
}

fn bicubic(src: ImageView<'_, f64>, x: f64, y: f64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as isize, y0 as isize);

    let wx = [
        cubic_weight(fx + 1.0),
        cubic_weight(fx),
        cubic_weight(1.0 - fx),
        cubic_weight(2.0 - fx),
    ];
    let mut acc = 0.0;
    for dy in -1isize..=2 {
        let wy = cubic_weight(fy - dy as f64);
        if wy == 0.0 {
            continue;
        }
        let mut row = 0.0;
        for (i, dx) in (-1isize..=2).enumerate() {
            row += wx[i] * pixel(src, x0 + dx, y0 + dy);
        }
        acc += wy * row;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::{sample, Interpolation};
    use crate::image::Image;

    fn ramp() -> Image {
        Image::from_fn(5, 4, |x, y| 2.0 * x as f64 + 3.0 * y as f64).unwrap()
    }

    #[test]
    fn integer_coordinates_reproduce_pixels() {
        let img = ramp();
        for interp in [Interpolation::Bilinear, Interpolation::Bicubic] {
            for y in 0..4 {
                for x in 0..5 {
                    let v = sample(img.view(), x as f64, y as f64, interp);
                    assert!((v - img.get(x, y).unwrap()).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn interior_samples_follow_linear_ramp() {
        let img = ramp();
        let v = sample(img.view(), 1.5, 1.25, Interpolation::Bilinear);
        assert!((v - (3.0 + 3.75)).abs() < 1e-12);
        let v = sample(img.view(), 2.5, 1.5, Interpolation::Bicubic);
        assert!((v - (5.0 + 4.5)).abs() < 1e-9);
    }

    #[test]
    fn outside_samples_are_zero() {
        let img = ramp();
        assert_eq!(sample(img.view(), -0.5, 1.0, Interpolation::Bicubic), 0.0);
        assert_eq!(sample(img.view(), 1.0, 3.5, Interpolation::Bilinear), 0.0);
        assert_eq!(sample(img.view(), f64::NAN, 1.0, Interpolation::Bilinear), 0.0);
    }
}
